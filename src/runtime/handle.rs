use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::{
    avatar::{AvatarPatch, AvatarRecord},
    config::RuntimeConfig,
    core::store::{CatalogDocument, CatalogStore, StoreError},
    export,
    ordering::{self, SortMode},
    persist::{DocumentSink, PersistError},
    types::{AvatarId, Revision},
};

use super::events::CatalogEvent;

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("persisting catalog: {0}")]
    Persist(Arc<PersistError>),
    #[error("catalog runtime is not running")]
    ChannelClosed,
}

impl From<PersistError> for RuntimeError {
    fn from(value: PersistError) -> Self {
        Self::Persist(Arc::new(value))
    }
}

type SharedSink = Arc<Mutex<Box<dyn DocumentSink>>>;

/// Cloneable front door to the catalog loop.
///
/// All reads and writes are serialized through one task, so every mutation
/// is a single read-modify-write of the whole document.
#[derive(Clone)]
pub struct CatalogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<CatalogEvent>,
}

enum Command {
    GetAll {
        resp: oneshot::Sender<Vec<AvatarRecord>>,
    },
    Get {
        id: AvatarId,
        resp: oneshot::Sender<Option<AvatarRecord>>,
    },
    Contains {
        id: AvatarId,
        resp: oneshot::Sender<bool>,
    },
    Len {
        resp: oneshot::Sender<usize>,
    },
    Add {
        record: AvatarRecord,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Update {
        id: AvatarId,
        patch: AvatarPatch,
        resp: oneshot::Sender<Result<AvatarRecord, RuntimeError>>,
    },
    Delete {
        id: AvatarId,
        resp: oneshot::Sender<Result<AvatarRecord, RuntimeError>>,
    },
    DeleteMany {
        ids: Vec<AvatarId>,
        resp: oneshot::Sender<Result<Vec<AvatarRecord>, RuntimeError>>,
    },
    ReplaceAll {
        records: Vec<AvatarRecord>,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Query {
        term: String,
        mode: SortMode,
        resp: oneshot::Sender<Vec<AvatarRecord>>,
    },
    Export {
        format: export::ExportFormat,
        resp: oneshot::Sender<String>,
    },
    Revision {
        resp: oneshot::Sender<Revision>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct LoopState {
    store: CatalogStore,
    sink: Option<SharedSink>,
    revision: Revision,
    events_tx: broadcast::Sender<CatalogEvent>,
}

/// Loads the catalog from `sink` (empty when nothing was stored yet) and
/// spawns the loop around it.
pub async fn open_catalog(
    sink: Box<dyn DocumentSink>,
    config: RuntimeConfig,
) -> Result<CatalogHandle, RuntimeError> {
    let sink: SharedSink = Arc::new(Mutex::new(sink));
    let sink_ref = Arc::clone(&sink);
    let doc = tokio::task::spawn_blocking(move || sink_ref.blocking_lock().load())
        .await
        .map_err(|e| PersistError::Message(format!("join error: {e}")))??;

    let store = match doc {
        Some(doc) => CatalogStore::from_document(doc).map_err(PersistError::from)?,
        None => CatalogStore::new(),
    };
    debug!(avatars = store.len(), "catalog loaded");
    Ok(spawn_shared(store, Some(sink), config))
}

/// Spawns the loop around an already-built store. With `sink = None` the
/// catalog lives only in memory.
pub fn spawn_catalog(
    store: CatalogStore,
    sink: Option<Box<dyn DocumentSink>>,
    config: RuntimeConfig,
) -> CatalogHandle {
    spawn_shared(store, sink.map(|s| Arc::new(Mutex::new(s))), config)
}

fn spawn_shared(
    store: CatalogStore,
    sink: Option<SharedSink>,
    config: RuntimeConfig,
) -> CatalogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<CatalogEvent>(config.event_capacity.max(1));

    let mut state = LoopState {
        store,
        sink,
        revision: 0,
        events_tx: events_tx.clone(),
    };

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut state).await {
                break;
            }
        }
        debug!(revision = state.revision, "catalog loop stopped");
    });

    CatalogHandle { cmd_tx, events_tx }
}

impl CatalogHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events_tx.subscribe()
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    pub async fn get_all(&self) -> Result<Vec<AvatarRecord>, RuntimeError> {
        self.call(|resp| Command::GetAll { resp }).await
    }

    pub async fn get(&self, id: impl Into<AvatarId>) -> Result<Option<AvatarRecord>, RuntimeError> {
        let id = id.into();
        self.call(|resp| Command::Get { id, resp }).await
    }

    pub async fn contains(&self, id: impl Into<AvatarId>) -> Result<bool, RuntimeError> {
        let id = id.into();
        self.call(|resp| Command::Contains { id, resp }).await
    }

    pub async fn len(&self) -> Result<usize, RuntimeError> {
        self.call(|resp| Command::Len { resp }).await
    }

    pub async fn add(&self, record: AvatarRecord) -> Result<(), RuntimeError> {
        self.call(|resp| Command::Add { record, resp }).await?
    }

    /// Patches one avatar and returns its previous state.
    pub async fn update(
        &self,
        id: impl Into<AvatarId>,
        patch: AvatarPatch,
    ) -> Result<AvatarRecord, RuntimeError> {
        let id = id.into();
        self.call(|resp| Command::Update { id, patch, resp }).await?
    }

    /// Removes one avatar and returns it.
    pub async fn delete(&self, id: impl Into<AvatarId>) -> Result<AvatarRecord, RuntimeError> {
        let id = id.into();
        self.call(|resp| Command::Delete { id, resp }).await?
    }

    /// Removes every listed avatar that exists and returns the removed ones.
    pub async fn delete_many(&self, ids: Vec<AvatarId>) -> Result<Vec<AvatarRecord>, RuntimeError> {
        self.call(|resp| Command::DeleteMany { ids, resp }).await?
    }

    pub async fn replace_all(&self, records: Vec<AvatarRecord>) -> Result<(), RuntimeError> {
        self.call(|resp| Command::ReplaceAll { records, resp }).await?
    }

    /// Whole catalog in display order.
    pub async fn sorted(&self, mode: SortMode) -> Result<Vec<AvatarRecord>, RuntimeError> {
        self.search("", mode).await
    }

    /// Avatars whose name or author contains `term`, in display order.
    pub async fn search(
        &self,
        term: impl Into<String>,
        mode: SortMode,
    ) -> Result<Vec<AvatarRecord>, RuntimeError> {
        let term = term.into();
        self.call(|resp| Command::Query { term, mode, resp }).await
    }

    pub async fn to_csv(&self) -> Result<String, RuntimeError> {
        self.call(|resp| Command::Export {
            format: export::ExportFormat::Csv,
            resp,
        })
        .await
    }

    pub async fn to_text(&self) -> Result<String, RuntimeError> {
        self.call(|resp| Command::Export {
            format: export::ExportFormat::Text,
            resp,
        })
        .await
    }

    /// Count of successful mutations since the loop started.
    pub async fn revision(&self) -> Result<Revision, RuntimeError> {
        self.call(|resp| Command::Revision { resp }).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.call(|resp| Command::Shutdown { resp }).await
    }
}

async fn handle_command(cmd: Command, state: &mut LoopState) -> bool {
    match cmd {
        Command::GetAll { resp } => {
            let _ = resp.send(state.store.get_all());
        }
        Command::Get { id, resp } => {
            let _ = resp.send(state.store.get_cloned(&id));
        }
        Command::Contains { id, resp } => {
            let _ = resp.send(state.store.contains(&id));
        }
        Command::Len { resp } => {
            let _ = resp.send(state.store.len());
        }
        Command::Add { record, resp } => {
            let id = record.id.clone();
            let res = mutate(state, |store| store.add(record)).await;
            if res.is_ok() {
                state.emit(CatalogEvent::Added { id });
            }
            let _ = resp.send(res);
        }
        Command::Update { id, patch, resp } => {
            let res = mutate(state, |store| store.update(&id, &patch)).await;
            if res.is_ok() {
                state.emit(CatalogEvent::Updated { id });
            }
            let _ = resp.send(res);
        }
        Command::Delete { id, resp } => {
            let res = mutate(state, |store| store.delete(&id)).await;
            if res.is_ok() {
                state.emit(CatalogEvent::Deleted { id });
            }
            let _ = resp.send(res);
        }
        Command::DeleteMany { ids, resp } => {
            let res = mutate(state, |store| Ok(store.delete_many(&ids))).await;
            if let Ok(removed) = &res {
                state.emit(CatalogEvent::DeletedMany {
                    ids: removed.iter().map(|r| r.id.clone()).collect(),
                });
            }
            let _ = resp.send(res);
        }
        Command::ReplaceAll { records, resp } => {
            let res = mutate(state, |store| store.replace_all(records)).await;
            if res.is_ok() {
                state.emit(CatalogEvent::Replaced {
                    count: state.store.len(),
                });
            }
            let _ = resp.send(res);
        }
        Command::Query { term, mode, resp } => {
            let mut out: Vec<AvatarRecord> = state
                .store
                .get_all()
                .into_iter()
                .filter(|r| ordering::matches_term(r, &term))
                .collect();
            ordering::sort_avatars(&mut out, mode);
            let _ = resp.send(out);
        }
        Command::Export { format, resp } => {
            let _ = resp.send(export::render(&state.store.get_all(), format));
        }
        Command::Revision { resp } => {
            let _ = resp.send(state.revision);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

/// Runs `f` against the store and writes the resulting document. A failed
/// write restores the store to its state before `f`.
async fn mutate<T>(
    state: &mut LoopState,
    f: impl FnOnce(&mut CatalogStore) -> Result<T, StoreError>,
) -> Result<T, RuntimeError> {
    let before = state.store.clone();
    let out = f(&mut state.store)?;

    if let Some(sink) = &state.sink {
        let doc = state.store.export_document();
        if let Err(err) = save_document(sink, doc).await {
            warn!(error = %err, "catalog save failed, rolling back");
            state.store = before;
            return Err(err.into());
        }
    }

    state.revision += 1;
    Ok(out)
}

async fn save_document(sink: &SharedSink, doc: CatalogDocument) -> Result<(), PersistError> {
    let sink_ref = Arc::clone(sink);
    match tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        sink.save(&doc)
    })
    .await
    {
        Ok(inner) => inner,
        Err(e) => {
            error!(error = %e, "catalog save task died");
            Err(PersistError::Message(format!("join error: {e}")))
        }
    }
}

impl LoopState {
    /// Broadcasts a committed mutation, followed by the durability marker
    /// when a sink is attached.
    fn emit(&self, event: CatalogEvent) {
        let _ = self.events_tx.send(event);
        if self.sink.is_some() {
            let _ = self.events_tx.send(CatalogEvent::Persisted {
                revision: self.revision,
            });
        }
    }
}
