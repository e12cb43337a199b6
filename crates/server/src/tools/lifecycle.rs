//! sw_install, sw_activate and sw_state tool implementations.
//!
//! Delivers install and activate signals to the cache manager and keeps the
//! host's view of the worker phase in step.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::worker::{ActivateReport, InstallReport};
use swcache_core::{FetchStrategy, Network, OfflineCacheManager, PrecachePolicy};

use super::json_result;
use crate::state::{HostControl, WorkerPhase, WorkerState};

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    pub install: InstallReport,
    /// Present when skip-waiting let activation run right after install.
    pub activate: Option<ActivateReport>,
    /// Why the immediate activation failed; the version stays installed.
    pub activate_error: Option<String>,
    pub state: WorkerState,
}

impl SwInstallOutput {
    fn new(install: InstallReport, activation: Option<Result<ActivateReport, McpError>>, state: WorkerState) -> Self {
        let (activate, activate_error) = match activation {
            Some(Ok(report)) => (Some(report), None),
            Some(Err(e)) => (None, Some(e.message.to_string())),
            None => (None, None),
        };
        Self { install, activate, activate_error, state }
    }
}

/// Output from the sw_state tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStateOutput {
    pub cache_name: String,
    pub origin: String,
    pub strategy: FetchStrategy,
    pub precache_policy: PrecachePolicy,
    pub precache: Vec<String>,
    pub state: WorkerState,
}

/// Run install; if skip-waiting was signalled, activate immediately.
pub async fn install_impl<N: Network>(
    manager: &OfflineCacheManager<N, HostControl>,
) -> Result<CallToolResult, McpError> {
    let control = manager.control();
    control.set_phase(WorkerPhase::Installing).await;

    let install = match manager.install().await {
        Ok(report) => report,
        Err(e) => {
            control.set_phase(WorkerPhase::Redundant).await;
            return Err(e.into());
        }
    };
    control.set_phase(WorkerPhase::Installed).await;

    let activation = if control.state().await.skip_waiting { Some(activate_phase(manager).await) } else { None };

    json_result(&SwInstallOutput::new(install, activation, control.state().await))
}

/// Run activate explicitly.
pub async fn activate_impl<N: Network>(
    manager: &OfflineCacheManager<N, HostControl>,
) -> Result<CallToolResult, McpError> {
    let report = activate_phase(manager).await?;
    json_result(&report)
}

async fn activate_phase<N: Network>(manager: &OfflineCacheManager<N, HostControl>) -> Result<ActivateReport, McpError> {
    let control = manager.control();
    let previous = control.state().await.phase;
    control.set_phase(WorkerPhase::Activating).await;

    match manager.activate().await {
        Ok(report) => {
            control.set_phase(WorkerPhase::Activated).await;
            Ok(report)
        }
        Err(e) => {
            tracing::warn!("activation failed, staying {previous:?}: {e}");
            control.set_phase(previous).await;
            Err(e.into())
        }
    }
}

/// Report configuration and lifecycle state.
pub async fn state_impl<N: Network>(manager: &OfflineCacheManager<N, HostControl>) -> Result<CallToolResult, McpError> {
    let config = manager.config();
    json_result(&SwStateOutput {
        cache_name: config.cache_name.clone(),
        origin: config.origin.to_string(),
        strategy: config.strategy,
        precache_policy: config.precache_policy,
        precache: config.precache.iter().map(|u| u.to_string()).collect(),
        state: manager.control().state().await,
    })
}
