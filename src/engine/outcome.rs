use std::fmt;

use crate::{runtime::handle::RuntimeError, types::AvatarId};

use super::{gateway::GatewayError, summary::SyncSummary};

/// Which batch operation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    Import,
    Verify,
    Delete,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Import => "import",
            Self::Verify => "verify",
            Self::Delete => "delete",
        })
    }
}

/// Why one item of a run failed.
#[derive(Debug, Clone)]
pub enum SyncFailure {
    Transport(GatewayError),
    Timeout { after_ms: u64 },
    /// Verify was asked about an id the catalog does not hold.
    MissingFromCatalog,
    Catalog(RuntimeError),
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::Timeout { after_ms } => write!(f, "no response within {after_ms} ms"),
            Self::MissingFromCatalog => f.write_str("avatar is not in the catalog"),
            Self::Catalog(err) => write!(f, "catalog update failed: {err}"),
        }
    }
}

/// Per-item classification.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Imported, refreshed, or deleted as asked. `name` is absent only when a
    /// delete targeted an id the catalog did not hold.
    Resolved { name: Option<String> },
    /// Import skipped: already in the catalog or earlier in the same run.
    Duplicate,
    /// Verify found the avatar gone and removed it locally.
    Unavailable { name: String },
    Failed(SyncFailure),
}

/// Count bucket of a [`SyncOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Resolved,
    Duplicate,
    Unavailable,
    Failed,
}

impl SyncOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Resolved { .. } => OutcomeKind::Resolved,
            Self::Duplicate => OutcomeKind::Duplicate,
            Self::Unavailable { .. } => OutcomeKind::Unavailable,
            Self::Failed(_) => OutcomeKind::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One processed id.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub index: usize,
    pub id: AvatarId,
    pub outcome: SyncOutcome,
}

/// Emitted after every processed item, in strictly increasing `index`.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    pub index: usize,
    pub total: usize,
    /// `round(100 * (index + 1) / total)`.
    pub percent: u8,
    pub item: ItemOutcome,
}

impl SyncProgress {
    pub fn percent_for(index: usize, total: usize) -> u8 {
        if total == 0 {
            return 100;
        }
        let pct = (100.0 * (index + 1) as f64 / total as f64).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    Progress(SyncProgress),
    /// Always the last event of a run, cancelled or not.
    Completed(SyncSummary),
}
