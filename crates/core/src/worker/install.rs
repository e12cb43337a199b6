//! Install phase: open the current store and precache the shell.

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ClientControl, Network, OfflineCacheManager};
use crate::Error;
use crate::config::PrecachePolicy;
use crate::request::Request;

/// A precache asset left out of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkippedAsset {
    pub url: String,
    pub reason: String,
}

/// Result of a completed install.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    /// The store that was opened and populated.
    pub cache_name: String,
    /// Precache URLs now stored, in configured order.
    pub cached: Vec<String>,
    /// Assets skipped under the best-effort policy.
    pub skipped: Vec<SkippedAsset>,
}

impl<N: Network, C: ClientControl> OfflineCacheManager<N, C> {
    /// Run the install phase.
    ///
    /// Skip-waiting is signalled whether or not precaching succeeds.
    ///
    /// # Errors
    ///
    /// Under the atomic policy, returns `Error::InstallFailed` for the first
    /// asset (in list order) that failed to fetch or answered with a non-2xx
    /// status; nothing is stored in that case. Storage failures propagate.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let result = self.precache().await;
        self.control.skip_waiting().await;

        match &result {
            Ok(report) => tracing::info!(
                cache = %report.cache_name,
                cached = report.cached.len(),
                skipped = report.skipped.len(),
                "install complete"
            ),
            Err(e) => tracing::warn!(cache = %self.config.cache_name, "install failed: {e}"),
        }

        result
    }

    async fn precache(&self) -> Result<InstallReport, Error> {
        let cache = self.db.open_cache(&self.config.cache_name).await?;
        tracing::debug!(cache = %cache.name(), assets = self.config.precache.len(), "precaching");

        let fetches = self.config.precache.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self.network.fetch(&request).await;
            (request, response)
        });
        let results = join_all(fetches).await;

        let mut entries = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();

        for (request, response) in results {
            let reason = match response {
                Ok(snapshot) if snapshot.is_ok() => {
                    entries.push((request, snapshot));
                    continue;
                }
                Ok(snapshot) => format!("status {}", snapshot.status),
                Err(e) => e.to_string(),
            };

            match self.config.precache_policy {
                PrecachePolicy::Atomic => {
                    return Err(Error::InstallFailed { url: request.url.to_string(), reason });
                }
                PrecachePolicy::BestEffort => {
                    tracing::warn!(url = %request.url, "skipping precache asset: {reason}");
                    skipped.push(SkippedAsset { url: request.url.to_string(), reason });
                }
            }
        }

        cache.put_all(&entries).await?;

        Ok(InstallReport {
            cache_name: cache.name().to_string(),
            cached: entries.iter().map(|(request, _)| request.url.to_string()).collect(),
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::cache::ResponseType;
    use crate::config::{AppConfig, Release};
    use crate::worker::testing::{manager, release_manager, serve_shell, url};

    #[tokio::test]
    async fn test_install_precaches_every_asset() {
        let worker = release_manager(Release::V5).await;
        serve_shell(worker.network());

        let report = worker.install().await.unwrap();
        assert_eq!(report.cache_name, "viajeros-v5");
        assert_eq!(report.cached.len(), 3);
        assert!(report.skipped.is_empty());

        let cache = worker.db().open_cache("viajeros-v5").await.unwrap();
        for precached in &worker.config().precache {
            let hit = cache.match_request(&Request::get(precached.clone())).await.unwrap();
            assert!(hit.is_some(), "missing {precached}");
        }
        assert!(worker.control().skipped_waiting.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_atomic_install_fails_on_unreachable_cdn() {
        let worker = release_manager(Release::V2).await;
        let network = worker.network();
        network.serve_local("/index.html", "<html>shell</html>");
        network.serve_local("/manifest.json", "{}");
        network.serve("https://cdn.tailwindcss.com/", 200, ResponseType::Cors, "tw");
        // vue, phosphor, fonts and the icon stay unreachable.

        let result = worker.install().await;
        match result {
            Err(Error::InstallFailed { url, .. }) => assert_eq!(url, "https://unpkg.com/vue@3/dist/vue.global.js"),
            other => panic!("expected InstallFailed, got {other:?}"),
        }

        let cache = worker.db().open_cache("viajeros-v2").await.unwrap();
        assert!(cache.keys().await.unwrap().is_empty());
        assert!(worker.control().skipped_waiting.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_atomic_install_rejects_error_status() {
        let worker = release_manager(Release::V3).await;
        let network = worker.network();
        network.serve_local("/", "<html>root</html>");
        network.serve_local("/index.html", "<html>shell</html>");
        network.serve("http://localhost:8080/manifest.json", 404, ResponseType::Basic, "not found");

        let result = worker.install().await;
        assert!(matches!(result, Err(Error::InstallFailed { reason, .. }) if reason == "status 404"));
    }

    #[tokio::test]
    async fn test_best_effort_install_skips_failures() {
        let config = AppConfig {
            precache_policy: PrecachePolicy::BestEffort,
            ..AppConfig::for_release(Release::V2)
        };
        let worker = manager(config).await;
        let network = worker.network();
        network.serve_local("/index.html", "<html>shell</html>");
        network.serve_local("/manifest.json", "{}");

        let report = worker.install().await.unwrap();
        assert_eq!(report.cached, vec!["http://localhost:8080/index.html", "http://localhost:8080/manifest.json"]);
        assert_eq!(report.skipped.len(), 5);

        let cache = worker.db().open_cache("viajeros-v2").await.unwrap();
        assert!(
            cache
                .match_request(&Request::get(url("/index.html")))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_install_with_empty_list_creates_store() {
        let config = AppConfig { precache: Vec::new(), ..Default::default() };
        let worker = manager(config).await;

        let report = worker.install().await.unwrap();
        assert!(report.cached.is_empty());
        assert!(worker.db().has_cache("viajeros-v5").await.unwrap());
    }
}
