//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - Request descriptors and response snapshots
//! - The offline cache manager (install, activate, fetch routing)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod worker;

pub use cache::{Cache, CacheDb, ResponseType, Snapshot};
pub use config::{AppConfig, ConfigError, FetchStrategy, PrecachePolicy, Release};
pub use error::Error;
pub use request::{Request, RequestMode};
pub use worker::{ClientControl, FetchOutcome, Network, OfflineCacheManager, WorkerConfig};
