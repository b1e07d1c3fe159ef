use async_trait::async_trait;
use thiserror::Error;

use crate::avatar::AvatarRecord;

/// Remote call failure. Never means "the avatar is gone": that is
/// [`AvatarStatus::Unavailable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("remote returned HTTP {status}{}", reason_suffix(.reason))]
    Http { status: u16, reason: Option<String> },
    #[error("network error: {0}")]
    Network(String),
    #[error("could not decode remote response: {0}")]
    Decode(String),
    #[error("remote call timed out")]
    Timeout,
}

/// Result of re-checking an avatar that is already in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarStatus {
    /// Still published; carries the current remote data.
    Available(AvatarRecord),
    /// Confirmed removed or private on the remote side.
    Unavailable,
}

/// The remote source of truth for avatar data.
#[async_trait]
pub trait AvatarGateway: Send + Sync + 'static {
    /// Fetches the full record for `id`.
    async fn resolve(&self, id: &str) -> Result<AvatarRecord, GatewayError>;

    /// Re-checks `id`. Must only report `Unavailable` when the remote side
    /// confirms it; anything ambiguous is an error.
    async fn status(&self, id: &str) -> Result<AvatarStatus, GatewayError>;

    /// Switches the signed-in user into `id`.
    async fn select(&self, id: &str) -> Result<(), GatewayError>;
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(" {r}")).unwrap_or_default()
}
