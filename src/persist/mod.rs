pub mod memory;
pub mod sqlite;

use thiserror::Error;

use crate::{
    avatar::AvatarRecord,
    core::store::{CatalogDocument, DOCUMENT_FORMAT_VERSION, StoreError},
};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("document encoding: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported document format version {0}")]
    UnsupportedFormat(u16),
    #[error("stored document is inconsistent: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Whole-document persistence primitive.
///
/// Implementations must replace the stored document atomically: a reader
/// sees either the previous document or the new one, never a mix.
pub trait DocumentSink: Send {
    fn load(&self) -> PersistResult<Option<CatalogDocument>>;
    fn save(&mut self, doc: &CatalogDocument) -> PersistResult<()>;
}

pub fn encode_document(doc: &CatalogDocument) -> PersistResult<Vec<u8>> {
    Ok(serde_json::to_vec(doc)?)
}

pub fn decode_document(payload: &[u8]) -> PersistResult<CatalogDocument> {
    if let Ok(doc) = serde_json::from_slice::<CatalogDocument>(payload) {
        if doc.format_version != DOCUMENT_FORMAT_VERSION {
            return Err(PersistError::UnsupportedFormat(doc.format_version));
        }
        return Ok(doc);
    }

    // Older layout: a bare JSON array of avatars under the key.
    let avatars: Vec<AvatarRecord> = serde_json::from_slice(payload)?;
    Ok(CatalogDocument::new(avatars))
}
