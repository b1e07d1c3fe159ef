//! SQLite-backed single-key document sink.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::core::store::CatalogDocument;

use super::{DocumentSink, PersistResult, decode_document, encode_document};

/// Key the catalog document is stored under.
pub const CATALOG_KEY: &str = "vrchat_avatars";

/// SQLite implementation of [`crate::persist::DocumentSink`].
pub struct SqliteDocumentSink {
    conn: Connection,
    key: String,
}

impl SqliteDocumentSink {
    /// Opens or creates a SQLite-backed sink at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite sink.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            conn,
            key: CATALOG_KEY.to_string(),
        })
    }

    /// Number of times the document row has been written.
    pub fn revision(&self) -> PersistResult<u64> {
        let rev: Option<i64> = self
            .conn
            .query_row(
                "SELECT revision FROM documents WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rev.unwrap_or(0) as u64)
    }

    /// Writes raw bytes under the catalog key, bypassing encoding.
    pub fn put_raw(&mut self, payload: &[u8]) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO documents(key, revision, updated_ms, payload) VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                revision = revision + 1,
                updated_ms = excluded.updated_ms,
                payload = excluded.payload",
            params![self.key, now_ms() as i64, payload],
        )?;
        Ok(())
    }
}

impl DocumentSink for SqliteDocumentSink {
    fn load(&self) -> PersistResult<Option<CatalogDocument>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM documents WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;

        payload.as_deref().map(decode_document).transpose()
    }

    fn save(&mut self, doc: &CatalogDocument) -> PersistResult<()> {
        let payload = encode_document(doc)?;
        self.put_raw(&payload)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
