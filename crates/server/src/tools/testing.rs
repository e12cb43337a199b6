//! Shared fixtures for tool tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use rmcp::model::CallToolResult;
use swcache_core::{
    AppConfig, CacheDb, Error, Network, OfflineCacheManager, Release, Request, ResponseType, Snapshot,
};

use crate::state::HostControl;

pub const ORIGIN: &str = "http://localhost:8080";

/// Network serving local paths from a table; can be switched offline.
#[derive(Default)]
pub struct StubNetwork {
    bodies: Mutex<HashMap<String, (u16, &'static str)>>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub fn serve(&self, path: &str, status: u16, body: &'static str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(format!("{ORIGIN}{path}"), (status, body));
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Snapshot, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let bodies = self.bodies.lock().unwrap();
        let (status, body) = bodies
            .get(request.url.as_str())
            .copied()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))?;
        Ok(Snapshot::new(request.url.as_str(), status, ResponseType::Basic, body))
    }
}

pub type TestManager = OfflineCacheManager<StubNetwork, HostControl>;

/// A v5 manager whose network serves the app shell.
pub async fn manager() -> TestManager {
    let network = StubNetwork::default();
    network.serve("/", 200, "<html>root</html>");
    network.serve("/index.html", 200, "<html>shell</html>");
    network.serve("/manifest.json", 200, "{}");

    let config = AppConfig::for_release(Release::V5).worker_config().unwrap();
    OfflineCacheManager::new(CacheDb::open_in_memory().await.unwrap(), network, HostControl::default(), config)
}

/// Parse the JSON text content of a tool result.
pub fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
