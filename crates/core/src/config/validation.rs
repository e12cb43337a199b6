//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or presets.

use crate::config::{AppConfig, PrecachePolicy};
use crate::request::same_origin;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `cache_version` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `shell_path` does not start with `/`
    /// - a precache entry cannot be resolved
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set SWCACHE_CACHE_VERSION or pick a release with SWCACHE_RELEASE".into(),
            });
        }

        if !self.shell_path.starts_with('/') {
            return Err(ConfigError::Invalid { field: "shell_path".into(), reason: "must start with '/'".into() });
        }

        let worker = self.worker_config()?;

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        let cross_origin = worker
            .precache
            .iter()
            .filter(|url| !same_origin(url, &worker.origin))
            .count();
        if cross_origin > 0 && self.precache_policy == PrecachePolicy::Atomic {
            tracing::warn!(
                cross_origin,
                cache = %self.cache_version,
                "precache list includes cross-origin assets under the atomic policy; \
                 one unreachable asset fails the whole install"
            );
        }

        Ok(())
    }
}
