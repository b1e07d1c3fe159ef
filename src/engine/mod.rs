//! Batch synchronization between the catalog and the remote gateway.

/// Run orchestration, handles, and pacing.
pub mod batch;
/// Remote gateway contract.
pub mod gateway;
/// Per-item outcomes and run events.
pub mod outcome;
/// Per-run aggregate summary.
pub mod summary;
