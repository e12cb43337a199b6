//! cache_get tool implementation.
//!
//! Looks a URL up across every cache store, oldest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::request::resolve;
use swcache_core::{CacheDb, Error, Request};
use url::Url;

use crate::tools::{ResponseSummary, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached response, absolute or relative to the origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// The stored response.
    pub response: ResponseSummary,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, origin: &Url, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let snapshot = cache
        .match_any(&Request::get(url.clone()))
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    json_result(&CacheGetOutput { response: ResponseSummary::from(&snapshot) })
}
