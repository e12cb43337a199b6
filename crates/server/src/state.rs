//! Worker lifecycle state tracked by the host.
//!
//! The host is the runtime the cache manager signals: skip-waiting and
//! clients-claim land here, and fetch interception only starts once open
//! clients are claimed.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::ClientControl;
use tokio::sync::RwLock;

/// Lifecycle phase of the hosted worker version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version will never activate.
    Redundant,
}

/// Snapshot of the hosted worker's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerState {
    pub phase: WorkerPhase,
    /// Skip-waiting was signalled during install.
    pub skip_waiting: bool,
    /// Open clients are controlled; fetches are intercepted.
    pub clients_claimed: bool,
}

/// Host side of the client-control seam.
#[derive(Debug, Clone, Default)]
pub struct HostControl {
    state: Arc<RwLock<WorkerState>>,
}

impl HostControl {
    pub async fn state(&self) -> WorkerState {
        self.state.read().await.clone()
    }

    pub async fn set_phase(&self, phase: WorkerPhase) {
        let mut state = self.state.write().await;
        tracing::debug!(from = ?state.phase, to = ?phase, "worker phase");
        state.phase = phase;
    }

    /// Whether fetches should be routed through the cache manager.
    pub async fn is_controlling(&self) -> bool {
        let state = self.state.read().await;
        state.phase == WorkerPhase::Activated && state.clients_claimed
    }
}

#[async_trait::async_trait]
impl ClientControl for HostControl {
    async fn skip_waiting(&self) {
        self.state.write().await.skip_waiting = true;
    }

    async fn claim(&self) {
        self.state.write().await.clients_claimed = true;
    }
}
