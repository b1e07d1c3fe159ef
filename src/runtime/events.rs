//! Runtime event stream payloads.

use crate::types::{AvatarId, Revision};

/// Events emitted from the single-writer catalog loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A new avatar was added.
    Added {
        /// Added avatar id.
        id: AvatarId,
    },
    /// An existing avatar was refreshed or patched.
    Updated {
        /// Updated avatar id.
        id: AvatarId,
    },
    /// One avatar was removed.
    Deleted {
        /// Removed avatar id.
        id: AvatarId,
    },
    /// A bulk removal finished.
    DeletedMany {
        /// Ids actually removed, in former catalog order.
        ids: Vec<AvatarId>,
    },
    /// The whole catalog was replaced.
    Replaced {
        /// Number of avatars after the replace.
        count: usize,
    },
    /// The document sink has stored the catalog as of this revision.
    Persisted {
        /// Revision that is now durable.
        revision: Revision,
    },
}
