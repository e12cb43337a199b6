//! cache_keys tool implementation.
//!
//! Lists cache stores, or the request URLs held by one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::CacheDb;

use crate::error::HostError;
use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Store to list entries for; omit to list the stores themselves.
    #[serde(default)]
    pub cache: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// All stores, in creation order.
    pub caches: Vec<String>,
    /// The current version's store name.
    pub current: String,
    /// Request URLs in the requested store.
    pub entries: Option<Vec<String>>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, current: &str, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let caches = cache.cache_names().await?;

    let entries = match params.cache {
        Some(name) if caches.contains(&name) => Some(cache.entry_urls(&name).await?),
        Some(name) => return Err(HostError::UnknownCache(name).into()),
        None => None,
    };

    json_result(&CacheKeysOutput { caches, current: current.to_string(), entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::lifecycle::install_impl;
    use crate::tools::testing::{manager, output_json};

    #[tokio::test]
    async fn test_keys_lists_stores() {
        let manager = manager().await;
        manager.db().open_cache("viajeros-v3").await.unwrap();
        manager.db().open_cache("viajeros-v5").await.unwrap();

        let output = output_json(&keys_impl(manager.db(), "viajeros-v5", CacheKeysParams::default()).await.unwrap());
        assert_eq!(output["caches"], serde_json::json!(["viajeros-v3", "viajeros-v5"]));
        assert_eq!(output["current"], "viajeros-v5");
        assert!(output["entries"].is_null());
    }

    #[tokio::test]
    async fn test_keys_lists_entries() {
        let manager = manager().await;
        install_impl(&manager).await.unwrap();

        let params = CacheKeysParams { cache: Some("viajeros-v5".into()) };
        let output = output_json(&keys_impl(manager.db(), "viajeros-v5", params).await.unwrap());
        assert_eq!(
            output["entries"],
            serde_json::json!([
                "http://localhost:8080/",
                "http://localhost:8080/index.html",
                "http://localhost:8080/manifest.json"
            ])
        );
    }

    #[tokio::test]
    async fn test_keys_unknown_cache() {
        let manager = manager().await;
        let params = CacheKeysParams { cache: Some("viajeros-v1".into()) };
        assert!(keys_impl(manager.db(), "viajeros-v5", params).await.is_err());
        assert!(!manager.db().has_cache("viajeros-v1").await.unwrap());
    }
}
