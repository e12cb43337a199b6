//! Offline cache manager.
//!
//! Owns the lifecycle of one versioned cache store and routes intercepted
//! requests between that store and the network.
//!
//! ### Lifecycle
//! - `install`: open the current store and precache the configured assets,
//!   then signal skip-waiting.
//! - `activate`: delete every store whose name is not the current version,
//!   then claim open clients.
//!
//! ### Routing
//! - Non-GET requests are never intercepted.
//! - `cache_first`: serve from cache, fill from the network on a miss.
//! - `navigation_split`: navigations go network first with the app shell as
//!   offline fallback; everything else is cache first.

mod activate;
mod fetch;
mod install;

pub use activate::{ActivateReport, FailedDeletion};
pub use fetch::FetchOutcome;
pub use install::{InstallReport, SkippedAsset};

use url::Url;

use crate::Error;
use crate::cache::{CacheDb, Snapshot};
use crate::config::{FetchStrategy, PrecachePolicy};
use crate::request::Request;

/// Resolved settings for one deployed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name of the current cache store.
    pub cache_name: String,
    pub origin: Url,
    /// Absolute precache URLs, in configured order.
    pub precache: Vec<Url>,
    /// App shell served to offline navigations.
    pub shell: Url,
    pub strategy: FetchStrategy,
    pub precache_policy: PrecachePolicy,
}

/// Network access used on cache misses and during install.
///
/// Any HTTP status is a successful fetch; `Err` means no response at all.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Snapshot, Error>;
}

/// Signals the manager sends to its host about client control.
#[async_trait::async_trait]
pub trait ClientControl: Send + Sync {
    /// Activate this version without waiting for older instances to finish.
    async fn skip_waiting(&self);

    /// Take control of already-open pages.
    async fn claim(&self);
}

/// The offline cache manager.
pub struct OfflineCacheManager<N, C> {
    db: CacheDb,
    network: N,
    control: C,
    config: WorkerConfig,
}

impl<N: Network, C: ClientControl> OfflineCacheManager<N, C> {
    pub fn new(db: CacheDb, network: N, control: C, config: WorkerConfig) -> Self {
        Self { db, network, control, config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn control(&self) -> &C {
        &self.control
    }
}
