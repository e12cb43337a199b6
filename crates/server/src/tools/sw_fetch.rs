//! sw_fetch tool implementation.
//!
//! Delivers one fetch event. While the worker controls its clients the
//! request goes through the cache manager; otherwise, and for anything the
//! manager passes through, the host performs a plain network fetch.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::request::{resolve, same_origin};
use swcache_core::{Error, FetchOutcome, Network, OfflineCacheManager, Request, RequestMode, ResponseType, Snapshot};

use super::json_result;
use crate::error::HostError;
use crate::state::HostControl;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Top-level document load rather than a subresource.
    #[serde(default)]
    pub navigate: bool,

    /// Cross-origin request without CORS permission.
    #[serde(default)]
    pub no_cors: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Response as returned to the page.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSummary {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

impl From<&Snapshot> for ResponseSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            url: snapshot.url.clone(),
            status: snapshot.status,
            status_text: snapshot.status_text.clone(),
            response_type: snapshot.response_type,
            headers: snapshot.headers.clone(),
            body: snapshot.body_text().into_owned(),
            body_bytes: snapshot.body.len(),
        }
    }
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// How the request was answered: `uncontrolled`, `passthrough`,
    /// `cache_hit`, `network_filled`, `network_uncached`, `network`,
    /// `shell_fallback`, or `failed`.
    pub outcome: String,
    /// Response handed to the page; absent when the load failed.
    pub response: Option<ResponseSummary>,
    /// Why no response was produced.
    pub reason: Option<String>,
}

impl SwFetchParams {
    fn to_request(&self, origin: &url::Url) -> Result<Request, McpError> {
        if self.method.trim().is_empty() {
            return Err(HostError::InvalidInput("method cannot be empty".into()).into());
        }

        let url = resolve(origin, &self.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))?;
        let mode = if self.navigate {
            RequestMode::Navigate
        } else if self.no_cors {
            RequestMode::NoCors
        } else if same_origin(origin, &url) {
            RequestMode::SameOrigin
        } else {
            RequestMode::Cors
        };

        Ok(Request::new(&self.method, url, mode))
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<N: Network>(
    manager: &OfflineCacheManager<N, HostControl>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = params.to_request(&manager.config().origin)?;

    if !manager.control().is_controlling().await {
        tracing::debug!(url = %request.url, "worker not controlling, fetching directly");
        return json_result(&default_fetch(manager.network(), &request, "uncontrolled").await);
    }

    let output = match manager.handle_fetch(&request).await {
        FetchOutcome::Passthrough => default_fetch(manager.network(), &request, "passthrough").await,
        FetchOutcome::Failed { reason } => SwFetchOutput {
            url: request.url.to_string(),
            outcome: "failed".into(),
            response: None,
            reason: Some(reason),
        },
        answered => SwFetchOutput {
            url: request.url.to_string(),
            outcome: answered.kind().into(),
            response: answered.response().map(ResponseSummary::from),
            reason: None,
        },
    };

    json_result(&output)
}

/// The host's own network handling for requests the manager does not answer.
async fn default_fetch<N: Network>(network: &N, request: &Request, outcome: &str) -> SwFetchOutput {
    let (response, reason) = match network.fetch(request).await {
        Ok(snapshot) => (Some(ResponseSummary::from(&snapshot)), None),
        Err(e) => (None, Some(e.to_string())),
    };
    SwFetchOutput { url: request.url.to_string(), outcome: outcome.into(), response, reason }
}
