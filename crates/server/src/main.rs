//! swcache host entry point.
//!
//! Boots the MCP server on stdio transport. Lifecycle and fetch events arrive
//! as tool calls. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb, OfflineCacheManager};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker = config.worker_config()?;

    tracing::info!(
        cache = %worker.cache_name,
        origin = %worker.origin,
        db = %config.db_path.display(),
        "Starting swcache host on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from_app(&config)?)?;
    let manager = OfflineCacheManager::new(db.clone(), network, state::HostControl::default(), worker);

    let handler = handler::SwHost::new(manager);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    db.close().await?;

    Ok(())
}
