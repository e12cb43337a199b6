//! Activate phase: prune stale stores and claim clients.

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ClientControl, Network, OfflineCacheManager};
use crate::Error;

/// A stale store that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailedDeletion {
    pub cache_name: String,
    pub reason: String,
}

/// Result of the activate phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    /// The store kept as current.
    pub current: String,
    /// Stale stores removed.
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed; they remain on disk.
    pub failed: Vec<FailedDeletion>,
}

impl<N: Network, C: ClientControl> OfflineCacheManager<N, C> {
    /// Run the activate phase.
    ///
    /// Every store other than the current version is deleted independently;
    /// one failed deletion does not stop the others. Clients are claimed
    /// whether or not pruning succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store names cannot be listed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let result = self.prune_stale().await;
        self.control.claim().await;
        result
    }

    async fn prune_stale(&self) -> Result<ActivateReport, Error> {
        let current = &self.config.cache_name;
        let stale: Vec<String> = self
            .db
            .cache_names()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let deletions = stale.iter().map(|name| async move { (name, self.db.delete_cache(name).await) });
        let results = join_all(deletions).await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (name, result) in results {
            match result {
                Ok(true) => deleted.push(name.clone()),
                Ok(false) => tracing::debug!(cache = %name, "stale cache already gone"),
                Err(e) => {
                    tracing::warn!(cache = %name, "failed to delete stale cache: {e}");
                    failed.push(FailedDeletion { cache_name: name.clone(), reason: e.to_string() });
                }
            }
        }

        tracing::info!(current = %current, deleted = deleted.len(), failed = failed.len(), "activated");

        Ok(ActivateReport { current: current.clone(), deleted, failed })
    }
}
