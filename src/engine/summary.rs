use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::types::AvatarId;

use super::outcome::{ItemOutcome, RunKind, SyncFailure, SyncOutcome};

/// Aggregate result of one batch run.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub kind: RunKind,
    /// Ids handed to the run, including ones never reached after a cancel.
    pub requested: usize,
    pub resolved: usize,
    pub duplicates: usize,
    pub unavailable: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub resolved_ids: Vec<AvatarId>,
    pub duplicate_ids: Vec<AvatarId>,
    /// `(id, name)` of every avatar found unavailable, in run order.
    pub unavailable_export: Vec<(AvatarId, String)>,
    /// Failure per id, in first-failure order; a repeat id keeps its slot and
    /// takes the latest reason.
    pub failures: Vec<(AvatarId, SyncFailure)>,
    failure_slots: HashMap<AvatarId, usize>,
}

impl SyncSummary {
    pub fn new(kind: RunKind, requested: usize) -> Self {
        Self {
            kind,
            requested,
            resolved: 0,
            duplicates: 0,
            unavailable: 0,
            failed: 0,
            cancelled: false,
            resolved_ids: Vec::new(),
            duplicate_ids: Vec::new(),
            unavailable_export: Vec::new(),
            failures: Vec::new(),
            failure_slots: HashMap::new(),
        }
    }

    pub fn record(&mut self, item: &ItemOutcome) {
        match &item.outcome {
            SyncOutcome::Resolved { .. } => {
                self.resolved += 1;
                self.resolved_ids.push(item.id.clone());
            }
            SyncOutcome::Duplicate => {
                self.duplicates += 1;
                self.duplicate_ids.push(item.id.clone());
            }
            SyncOutcome::Unavailable { name } => {
                self.unavailable += 1;
                self.unavailable_export.push((item.id.clone(), name.clone()));
            }
            SyncOutcome::Failed(failure) => {
                self.failed += 1;
                match self.failure_slots.get(&item.id) {
                    Some(&slot) => self.failures[slot].1 = failure.clone(),
                    None => {
                        self.failure_slots.insert(item.id.clone(), self.failures.len());
                        self.failures.push((item.id.clone(), failure.clone()));
                    }
                }
            }
        }
    }

    /// Items that produced an outcome.
    pub fn processed(&self) -> usize {
        self.resolved + self.duplicates + self.unavailable + self.failed
    }

    /// Avatars removed locally because the remote side no longer has them.
    pub fn deleted(&self) -> usize {
        self.unavailable
    }

    pub fn failure_for(&self, id: &str) -> Option<&SyncFailure> {
        self.failure_slots
            .get(id)
            .map(|&slot| &self.failures[slot].1)
    }

    /// Failed ids grouped by rendered reason, for error reports.
    pub fn failures_by_reason(&self) -> BTreeMap<String, Vec<AvatarId>> {
        let mut out: BTreeMap<String, Vec<AvatarId>> = BTreeMap::new();
        for (id, failure) in &self.failures {
            out.entry(failure.to_string()).or_default().push(id.clone());
        }
        out
    }
}
