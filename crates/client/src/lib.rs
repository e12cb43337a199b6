//! Client code for swcache.
//!
//! This crate provides the HTTP fetch pipeline the offline cache manager
//! falls through to on a cache miss.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, classify};
