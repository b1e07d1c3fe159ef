//! In-memory authoritative catalog store.

/// Authoritative avatar store and document conversion.
pub mod store;
