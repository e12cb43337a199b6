//! Built-in release presets.
//!
//! Each preset reproduces one deployed generation of the offline cache:
//! its cache name, precache list, and fetch strategy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ConfigError, FetchStrategy};

const V2_PRECACHE: &[&str] = &[
    "./index.html",
    "./manifest.json",
    "https://cdn.tailwindcss.com",
    "https://unpkg.com/vue@3/dist/vue.global.js",
    "https://unpkg.com/@phosphor-icons/web",
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;600;700;800&display=swap",
    "https://cdn-icons-png.flaticon.com/512/201/201623.png",
];

const V3_PRECACHE: &[&str] = &["./", "./index.html", "./manifest.json"];

const V5_PRECACHE: &[&str] = &["/", "/index.html", "/manifest.json"];

/// A deployed generation of the offline cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Release {
    /// Local shell plus third-party CDN assets, cache-first.
    V2,
    /// Local shell only, cache-first with runtime caching of CDN assets.
    V3,
    /// Local shell only, navigation-aware split strategy.
    #[default]
    V5,
}

impl Release {
    pub fn cache_name(self) -> &'static str {
        match self {
            Release::V2 => "viajeros-v2",
            Release::V3 => "viajeros-v3",
            Release::V5 => "viajeros-v5",
        }
    }

    pub fn precache(self) -> &'static [&'static str] {
        match self {
            Release::V2 => V2_PRECACHE,
            Release::V3 => V3_PRECACHE,
            Release::V5 => V5_PRECACHE,
        }
    }

    pub fn strategy(self) -> FetchStrategy {
        match self {
            Release::V2 | Release::V3 => FetchStrategy::CacheFirst,
            Release::V5 => FetchStrategy::NavigationSplit,
        }
    }
}

impl FromStr for Release {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches('v') {
            "2" => Ok(Release::V2),
            "3" => Ok(Release::V3),
            "5" => Ok(Release::V5),
            _ => Err(ConfigError::Invalid { field: "release".into(), reason: format!("unknown release: {s}") }),
        }
    }
}
