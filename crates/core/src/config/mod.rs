//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Release preset defaults (SWCACHE_RELEASE, default v5)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod release;
mod validation;

pub use release::Release;
pub use validation::ConfigError;

use crate::request::resolve;
use crate::worker::WorkerConfig;

/// How intercepted GET requests are routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Cache first for every GET, filling the cache from the network on a miss.
    CacheFirst,
    /// Network first for navigations with the app shell as offline fallback;
    /// cache first for everything else.
    #[default]
    NavigationSplit,
}

/// What install does when a precache asset cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrecachePolicy {
    /// Any failure aborts install and nothing is stored.
    #[default]
    Atomic,
    /// Failures are skipped and reported; the rest is stored.
    BestEffort,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Release preset defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache store, e.g. `viajeros-v5`.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    pub cache_version: String,

    /// Assets stored at install time, absolute or relative to `origin`.
    ///
    /// Set via SWCACHE_PRECACHE environment variable (`[a, b]` array syntax).
    #[serde(default)]
    pub precache: Vec<String>,

    /// Origin of the application being cached.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path of the app shell served to navigations when offline.
    #[serde(default = "default_shell_path")]
    pub shell_path: String,

    #[serde(default)]
    pub strategy: FetchStrategy,

    #[serde(default)]
    pub precache_policy: PrecachePolicy,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional request timeout in milliseconds. Unset means requests may
    /// wait indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_shell_path() -> String {
    "/index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_release(Release::default())
    }
}

impl AppConfig {
    /// Defaults taken from a release preset.
    pub fn for_release(release: Release) -> Self {
        Self {
            cache_version: release.cache_name().to_string(),
            precache: release.precache().iter().map(|u| u.to_string()).collect(),
            origin: default_origin(),
            shell_path: default_shell_path(),
            strategy: release.strategy(),
            precache_policy: PrecachePolicy::Atomic,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
        }
    }

    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parsed application origin.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }

    /// Resolve the precache list and shell path into a worker configuration.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        let origin = self.origin_url()?;

        let precache = self
            .precache
            .iter()
            .map(|entry| {
                resolve(&origin, entry)
                    .map_err(|e| ConfigError::Invalid { field: "precache".into(), reason: format!("{entry}: {e}") })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shell = resolve(&origin, &self.shell_path)
            .map_err(|e| ConfigError::Invalid { field: "shell_path".into(), reason: e.to_string() })?;

        Ok(WorkerConfig {
            cache_name: self.cache_version.clone(),
            origin,
            precache,
            shell,
            strategy: self.strategy,
            precache_policy: self.precache_policy,
        })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Preset named by `SWCACHE_RELEASE` (default v5)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The release name is unknown
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let release = match std::env::var("SWCACHE_RELEASE") {
            Ok(name) => name.parse()?,
            Err(_) => Release::default(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::for_release(release)));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["release", "config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
