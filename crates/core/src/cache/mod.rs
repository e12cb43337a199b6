//! SQLite-backed cache storage for versioned response stores.
//!
//! This module provides a persistent set of named caches using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named caches listed in creation order, deleted with all their entries
//! - Request-keyed response snapshots (SHA-256 over method and URL)
//! - Atomic multi-entry inserts for install-time precaching
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod snapshots;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use snapshots::{ResponseType, Snapshot};
pub use storage::Cache;
