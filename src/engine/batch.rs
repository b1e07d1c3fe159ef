use std::sync::Arc;

use hashbrown::HashMap;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::{
    avatar::AvatarPatch,
    config::SyncConfig,
    core::store::StoreError,
    parser::InputParser,
    runtime::handle::{CatalogHandle, RuntimeError},
    types::AvatarId,
};

use super::{
    gateway::{AvatarGateway, AvatarStatus, GatewayError},
    outcome::{ItemOutcome, RunKind, SyncEvent, SyncFailure, SyncOutcome, SyncProgress},
    summary::SyncSummary,
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync run task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Orchestrates import, verify and delete runs against one catalog.
#[derive(Clone)]
pub struct SyncEngine {
    catalog: CatalogHandle,
    gateway: Arc<dyn AvatarGateway>,
    config: SyncConfig,
    parser: InputParser,
}

impl SyncEngine {
    pub fn new(
        catalog: CatalogHandle,
        gateway: Arc<dyn AvatarGateway>,
        config: SyncConfig,
    ) -> Self {
        Self {
            catalog,
            gateway,
            config,
            parser: InputParser::default(),
        }
    }

    pub fn with_parser(mut self, parser: InputParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn start_import(&self, ids: Vec<AvatarId>) -> RunHandle {
        self.start(RunKind::Import, ids)
    }

    /// Parses pasted text and imports every id found in it.
    pub fn import_text(&self, text: &str) -> RunHandle {
        self.start_import(self.parser.parse(text))
    }

    pub fn start_verify(&self, ids: Vec<AvatarId>) -> RunHandle {
        self.start(RunKind::Verify, ids)
    }

    /// Verifies every avatar currently in the catalog, in catalog order.
    pub async fn verify_all(&self) -> Result<RunHandle, RuntimeError> {
        let ids = self
            .catalog
            .get_all()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        Ok(self.start_verify(ids))
    }

    pub fn start_delete(&self, ids: Vec<AvatarId>) -> RunHandle {
        self.start(RunKind::Delete, ids)
    }

    /// Switches into `id` on the remote side. Not part of any batch run.
    pub async fn select(&self, id: &str) -> Result<(), SyncFailure> {
        with_timeout(&self.config, self.gateway.select(id)).await
    }

    fn start(&self, kind: RunKind, ids: Vec<AvatarId>) -> RunHandle {
        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let total = ids.len();

        let run = BatchRun {
            kind,
            ids,
            catalog: self.catalog.clone(),
            gateway: Arc::clone(&self.gateway),
            config: self.config.clone(),
            cancel: cancel.clone(),
            events_tx,
        };
        let join = tokio::spawn(run.execute());

        RunHandle {
            kind,
            total,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            events_rx,
            join,
        }
    }
}

/// Caller's side of a running batch: event stream, cancel switch, result.
///
/// Dropping the handle cancels the run.
pub struct RunHandle {
    kind: RunKind,
    total: usize,
    cancel: CancellationToken,
    _cancel_on_drop: DropGuard,
    events_rx: mpsc::UnboundedReceiver<SyncEvent>,
    join: JoinHandle<SyncSummary>,
}

impl RunHandle {
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Stops the run before its next remote call. Outcomes already applied
    /// stay applied.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next progress or completion event; `None` once the run has finished
    /// and every event was taken.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.events_rx.recv().await
    }

    /// Waits for the run and returns its summary, discarding unread events.
    pub async fn wait(self) -> Result<SyncSummary, SyncError> {
        Ok(self.join.await?)
    }

    /// Feeds every progress event to `on_progress`, then returns the summary.
    pub async fn drive(
        mut self,
        mut on_progress: impl FnMut(&SyncProgress),
    ) -> Result<SyncSummary, SyncError> {
        while let Some(event) = self.events_rx.recv().await {
            if let SyncEvent::Progress(progress) = &event {
                on_progress(progress);
            }
        }
        self.wait().await
    }
}

struct BatchRun {
    kind: RunKind,
    ids: Vec<AvatarId>,
    catalog: CatalogHandle,
    gateway: Arc<dyn AvatarGateway>,
    config: SyncConfig,
    cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
}

impl BatchRun {
    async fn execute(self) -> SyncSummary {
        let total = self.ids.len();
        info!(kind = %self.kind, total, "sync run started");

        let mut summary = SyncSummary::new(self.kind, total);
        match self.kind {
            RunKind::Delete => self.run_delete(&mut summary).await,
            RunKind::Import | RunKind::Verify => self.run_remote(&mut summary).await,
        }

        info!(
            kind = %self.kind,
            resolved = summary.resolved,
            duplicates = summary.duplicates,
            unavailable = summary.unavailable,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "sync run finished"
        );
        let _ = self.events_tx.send(SyncEvent::Completed(summary.clone()));
        summary
    }

    async fn run_remote(&self, summary: &mut SyncSummary) {
        let total = self.ids.len();
        let mut seen: HashMap<AvatarId, Option<SyncFailure>> = HashMap::new();

        for (index, id) in self.ids.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let (outcome, called_remote) = match self.kind {
                RunKind::Import => self.import_one(id, &mut seen).await,
                _ => self.verify_one(id).await,
            };
            self.emit_item(summary, index, id, outcome);

            if called_remote && index + 1 < total {
                self.pause().await;
            }
        }
    }

    /// A repeat within the run takes the first attempt's failure, or
    /// `Duplicate` when the first attempt did not fail. Neither calls remote.
    async fn import_one(
        &self,
        id: &AvatarId,
        seen: &mut HashMap<AvatarId, Option<SyncFailure>>,
    ) -> (SyncOutcome, bool) {
        if let Some(first) = seen.get(id) {
            let outcome = match first {
                Some(failure) => SyncOutcome::Failed(failure.clone()),
                None => SyncOutcome::Duplicate,
            };
            return (outcome, false);
        }

        let (outcome, called_remote) = self.import_new(id).await;
        let failure = match &outcome {
            SyncOutcome::Failed(failure) => Some(failure.clone()),
            _ => None,
        };
        seen.insert(id.clone(), failure);
        (outcome, called_remote)
    }

    async fn import_new(&self, id: &AvatarId) -> (SyncOutcome, bool) {
        match self.catalog.contains(id.clone()).await {
            Ok(true) => return (SyncOutcome::Duplicate, false),
            Ok(false) => {}
            Err(err) => return (SyncOutcome::Failed(SyncFailure::Catalog(err)), false),
        }

        let outcome = match with_timeout(&self.config, self.gateway.resolve(id)).await {
            Ok(mut record) => {
                record.id = id.clone();
                let name = record.name.clone();
                match self.catalog.add(record).await {
                    Ok(()) => SyncOutcome::Resolved { name: Some(name) },
                    Err(RuntimeError::Store(StoreError::AlreadyExists(_))) => {
                        SyncOutcome::Duplicate
                    }
                    Err(err) => SyncOutcome::Failed(SyncFailure::Catalog(err)),
                }
            }
            Err(failure) => SyncOutcome::Failed(failure),
        };
        (outcome, true)
    }

    async fn verify_one(&self, id: &AvatarId) -> (SyncOutcome, bool) {
        let stored = match self.catalog.get(id.clone()).await {
            Ok(Some(rec)) => rec,
            Ok(None) => return (SyncOutcome::Failed(SyncFailure::MissingFromCatalog), false),
            Err(err) => return (SyncOutcome::Failed(SyncFailure::Catalog(err)), false),
        };

        let outcome = match with_timeout(&self.config, self.gateway.status(id)).await {
            Ok(AvatarStatus::Available(fresh)) => {
                match self
                    .catalog
                    .update(id.clone(), AvatarPatch::refresh_from(&fresh))
                    .await
                {
                    Ok(_) => SyncOutcome::Resolved {
                        name: Some(fresh.name),
                    },
                    Err(err) => SyncOutcome::Failed(SyncFailure::Catalog(err)),
                }
            }
            Ok(AvatarStatus::Unavailable) => match self.catalog.delete(id.clone()).await {
                // Already gone locally means someone else removed it meanwhile.
                Ok(_) | Err(RuntimeError::Store(StoreError::MissingAvatar(_))) => {
                    SyncOutcome::Unavailable { name: stored.name }
                }
                Err(err) => SyncOutcome::Failed(SyncFailure::Catalog(err)),
            },
            Err(failure) => SyncOutcome::Failed(failure),
        };
        (outcome, true)
    }

    async fn run_delete(&self, summary: &mut SyncSummary) {
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
            return;
        }

        match self.catalog.delete_many(self.ids.clone()).await {
            Ok(removed) => {
                let names: HashMap<&str, &str> = removed
                    .iter()
                    .map(|r| (r.id.as_str(), r.name.as_str()))
                    .collect();
                for (index, id) in self.ids.iter().enumerate() {
                    let name = names.get(id.as_str()).map(|n| n.to_string());
                    self.emit_item(summary, index, id, SyncOutcome::Resolved { name });
                }
            }
            Err(err) => {
                for (index, id) in self.ids.iter().enumerate() {
                    let failure = SyncFailure::Catalog(err.clone());
                    self.emit_item(summary, index, id, SyncOutcome::Failed(failure));
                }
            }
        }
    }

    /// Inter-item delay; returns early when the run is cancelled.
    async fn pause(&self) {
        let delay = self.config.item_delay();
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }

    fn emit_item(
        &self,
        summary: &mut SyncSummary,
        index: usize,
        id: &AvatarId,
        outcome: SyncOutcome,
    ) {
        match &outcome {
            SyncOutcome::Failed(failure) => {
                warn!(kind = %self.kind, %id, index, reason = %failure, "sync item failed")
            }
            other => {
                debug!(kind = %self.kind, %id, index, outcome = ?other.kind(), "sync item done")
            }
        }

        let total = self.ids.len();
        let item = ItemOutcome {
            index,
            id: id.clone(),
            outcome,
        };
        summary.record(&item);
        let _ = self.events_tx.send(SyncEvent::Progress(SyncProgress {
            index,
            total,
            percent: SyncProgress::percent_for(index, total),
            item,
        }));
    }
}

/// Bounds one remote call by the configured timeout (`0` disables it).
async fn with_timeout<T>(
    config: &SyncConfig,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, SyncFailure> {
    let result = if config.request_timeout_ms == 0 {
        call.await
    } else {
        match tokio::time::timeout(config.request_timeout(), call).await {
            Ok(inner) => inner,
            Err(_) => {
                return Err(SyncFailure::Timeout {
                    after_ms: config.request_timeout_ms,
                });
            }
        }
    };
    result.map_err(SyncFailure::Transport)
}
