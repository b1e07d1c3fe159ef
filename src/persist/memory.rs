//! In-process document sink, mainly for tests and dry runs.

use std::sync::{Arc, Mutex};

use crate::core::store::CatalogDocument;

use super::{DocumentSink, PersistError, PersistResult, decode_document, encode_document};

/// Keeps the encoded document in shared memory.
///
/// Clones share the same slot, so a test can hand one clone to the runtime
/// and inspect what was written through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentSink {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
    saves: Arc<Mutex<usize>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryDocumentSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the slot with raw bytes, as if written by an earlier process.
    pub fn with_payload(payload: Vec<u8>) -> Self {
        let sink = Self::default();
        if let Ok(mut slot) = sink.slot.lock() {
            *slot = Some(payload);
        }
        sink
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }

    /// Raw bytes of the last saved document.
    pub fn payload(&self) -> Option<Vec<u8>> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Makes subsequent saves fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.lock() {
            *flag = fail;
        }
    }
}

impl DocumentSink for MemoryDocumentSink {
    fn load(&self) -> PersistResult<Option<CatalogDocument>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| PersistError::Message("memory sink poisoned".to_string()))?;
        slot.as_deref().map(decode_document).transpose()
    }

    fn save(&mut self, doc: &CatalogDocument) -> PersistResult<()> {
        if self.fail_saves.lock().map(|f| *f).unwrap_or(false) {
            return Err(PersistError::Message("save rejected".to_string()));
        }
        let payload = encode_document(doc)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| PersistError::Message("memory sink poisoned".to_string()))?;
        *slot = Some(payload);
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}
