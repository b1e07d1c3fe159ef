//! Remote gateway implementations.

/// reqwest client for the avatar API.
pub mod http;
