//! Cache-related MCP tools.
//!
//! This module provides read-only tools for inspecting cache storage.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
