//! Fetch interception and request routing.

use super::{ClientControl, Network, OfflineCacheManager};
use crate::cache::Snapshot;
use crate::config::FetchStrategy;
use crate::request::Request;

/// How an intercepted request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host applies its default network handling.
    Passthrough,
    /// Served from the cache without touching the network.
    CacheHit(Snapshot),
    /// Cache miss answered by the network and written back to the cache.
    NetworkFilled(Snapshot),
    /// Answered by the network but not written back (non-qualifying
    /// response, or the write failed).
    NetworkUncached(Snapshot),
    /// Navigation answered by the network.
    Network(Snapshot),
    /// Navigation failed on the network; the app shell was served instead.
    ShellFallback(Snapshot),
    /// Nothing could answer the request.
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Snapshot> {
        match self {
            FetchOutcome::CacheHit(s)
            | FetchOutcome::NetworkFilled(s)
            | FetchOutcome::NetworkUncached(s)
            | FetchOutcome::Network(s)
            | FetchOutcome::ShellFallback(s) => Some(s),
            FetchOutcome::Passthrough | FetchOutcome::Failed { .. } => None,
        }
    }

    /// Stable snake_case name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchOutcome::Passthrough => "passthrough",
            FetchOutcome::CacheHit(_) => "cache_hit",
            FetchOutcome::NetworkFilled(_) => "network_filled",
            FetchOutcome::NetworkUncached(_) => "network_uncached",
            FetchOutcome::Network(_) => "network",
            FetchOutcome::ShellFallback(_) => "shell_fallback",
            FetchOutcome::Failed { .. } => "failed",
        }
    }
}

impl<N: Network, C: ClientControl> OfflineCacheManager<N, C> {
    /// Route one intercepted request.
    ///
    /// Never fails: storage and network errors are logged and folded into
    /// the returned outcome.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !request.is_get() {
            tracing::debug!(method = %request.method, url = %request.url, "not intercepted");
            return FetchOutcome::Passthrough;
        }

        match self.config.strategy {
            FetchStrategy::NavigationSplit if request.is_navigation() => self.network_first(request).await,
            FetchStrategy::NavigationSplit | FetchStrategy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn cache_first(&self, request: &Request) -> FetchOutcome {
        match self.db.match_any(request).await {
            Ok(Some(snapshot)) => {
                tracing::debug!(url = %request.url, "cache hit");
                return FetchOutcome::CacheHit(snapshot);
            }
            Ok(None) => tracing::debug!(url = %request.url, "cache miss"),
            Err(e) => tracing::warn!(url = %request.url, "cache lookup failed, treating as miss: {e}"),
        }

        let response = match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(url = %request.url, "offline: resource not available in cache: {e}");
                return FetchOutcome::Failed { reason: e.to_string() };
            }
        };

        if !response.is_cacheable() {
            tracing::debug!(
                url = %request.url,
                status = response.status,
                response_type = %response.response_type,
                "response not cacheable"
            );
            return FetchOutcome::NetworkUncached(response);
        }

        let copy = response.clone();
        let stored = match self.db.open_cache(&self.config.cache_name).await {
            Ok(cache) => cache.put(request, &copy).await,
            Err(e) => Err(e),
        };

        match stored {
            Ok(()) => FetchOutcome::NetworkFilled(response),
            Err(e) => {
                tracing::warn!(url = %request.url, "failed to cache response: {e}");
                FetchOutcome::NetworkUncached(response)
            }
        }
    }

    async fn network_first(&self, request: &Request) -> FetchOutcome {
        let error = match self.network.fetch(request).await {
            Ok(response) => return FetchOutcome::Network(response),
            Err(e) => e,
        };

        tracing::info!(url = %request.url, shell = %self.config.shell, "navigation failed, serving app shell: {error}");

        let shell = Request::get(self.config.shell.clone());
        match self.db.match_any(&shell).await {
            Ok(Some(snapshot)) => FetchOutcome::ShellFallback(snapshot),
            Ok(None) => FetchOutcome::Failed { reason: format!("{error}; app shell not cached") },
            Err(e) => {
                tracing::warn!(shell = %self.config.shell, "app shell lookup failed: {e}");
                FetchOutcome::Failed { reason: format!("{error}; {e}") }
            }
        }
    }
}
