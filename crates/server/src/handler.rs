//! MCP server handler implementation.
//!
//! Routes tool calls to the lifecycle, fetch and cache inspection tools. The
//! host owns one cache manager for the lifetime of the process.

use std::sync::Arc;

use crate::state::HostControl;
use crate::tools::cache::{CacheGetParams, CacheKeysParams, get_impl, keys_impl};
use crate::tools::lifecycle::{activate_impl, install_impl, state_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::FetchClient;
use swcache_core::OfflineCacheManager;

/// The cache manager as wired by the host.
pub type HostManager = OfflineCacheManager<FetchClient, HostControl>;

/// The main MCP server handler for the swcache host.
#[derive(Clone)]
pub struct SwHost {
    tool_router: ToolRouter<Self>,
    manager: Arc<HostManager>,
}

#[tool_router]
impl SwHost {
    /// Create a new server handler around a cache manager.
    pub fn new(manager: HostManager) -> Self {
        Self { tool_router: Self::tool_router(), manager: Arc::new(manager) }
    }

    #[tool(
        description = "Deliver the install event: open the current cache store and precache the app shell. Activates immediately when skip-waiting is signalled."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.manager).await
    }

    #[tool(description = "Deliver the activate event: delete every cache store except the current version and claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.manager).await
    }

    #[tool(description = "Report the worker's lifecycle phase, cache name, precache list and fetch strategy.")]
    async fn sw_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.manager).await
    }

    /// Deliver one fetch event.
    ///
    /// While the worker controls clients, the request is answered by the
    /// configured strategy; otherwise it goes straight to the network.
    #[tool(
        description = "Deliver a fetch event for a URL. Returns the response handed to the page and how it was produced (cache_hit, network_filled, shell_fallback, ...)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, params.0).await
    }

    #[tool(description = "List cache stores, or the request URLs held by one store.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(self.manager.db(), &self.manager.config().cache_name, params.0).await
    }

    #[tool(description = "Look a URL up across all cache stores without touching the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.manager.db(), &self.manager.config().origin, params.0).await
    }
}

impl ServerHandler for SwHost {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache-host".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
