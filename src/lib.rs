//! Local avatar catalog kept in sync with a remote avatar API.
//!
//! The catalog lives behind a single-writer runtime that persists the whole
//! document on every mutation; batch runs (import, verify, delete) go
//! through [`engine::batch::SyncEngine`], one remote call at a time.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::CatalogStore`]:
//! ```
//! use avatar_catalog::{
//!     avatar::AvatarRecord,
//!     core::store::CatalogStore,
//!     ordering::{sort_avatars, SortMode},
//! };
//!
//! let mut store = CatalogStore::new();
//! store.add(AvatarRecord::new("avtr_01", "Fox")).expect("add");
//! store.add(AvatarRecord::new("avtr_02", "Owl")).expect("add");
//! store.delete_many(&["avtr_01".to_string()]);
//!
//! let mut all = store.get_all();
//! sort_avatars(&mut all, SortMode::Newest);
//! assert_eq!(all.len(), 1);
//! ```
//!
//! Runtime usage with a SQLite sink and the HTTP gateway:
//! ```no_run
//! use std::sync::Arc;
//!
//! use avatar_catalog::{
//!     config::AppConfig,
//!     engine::batch::SyncEngine,
//!     persist::sqlite::SqliteDocumentSink,
//!     remote::http::HttpGateway,
//!     runtime::handle::open_catalog,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cfg = AppConfig::default();
//! let sink = SqliteDocumentSink::open(&cfg.database_path).expect("open sqlite");
//! let catalog = open_catalog(Box::new(sink), cfg.runtime.clone()).await.expect("load");
//! let gateway = Arc::new(HttpGateway::new(&cfg.gateway).expect("client"));
//! let engine = SyncEngine::new(catalog.clone(), gateway, cfg.sync.clone());
//!
//! let run = engine.import_text("avtr_0123abcd\nhttps://vrchat.com/home/avatar/avtr_4567");
//! let summary = run.wait().await.expect("run");
//! println!("imported {}", summary.resolved);
//! catalog.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Avatar domain records and patches.
pub mod avatar;
/// Settings for the runtime, gateway, and batch runs.
pub mod config;
/// Core in-memory catalog store.
pub mod core;
/// Batch synchronization engine and gateway contract.
pub mod engine;
/// CSV and text exports.
pub mod export;
/// Display ordering and search.
pub mod ordering;
/// Free-form id input parsing.
pub mod parser;
/// Persistence abstraction with SQLite and in-memory implementations.
pub mod persist;
/// HTTP gateway implementation.
pub mod remote;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
