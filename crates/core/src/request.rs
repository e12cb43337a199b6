//! Request descriptors and URL resolution.
//!
//! Every URL that reaches the cache is absolute, http(s), and has its
//! fragment removed, so two spellings of the same resource share one key.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// How a request was initiated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    /// Cross-origin subresource without CORS permission; yields opaque responses.
    NoCors,
}

/// An intercepted request: method, absolute URL, and initiation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

impl Request {
    /// Build a request, upper-casing the method and dropping any fragment.
    pub fn new(method: &str, mut url: Url, mode: RequestMode) -> Self {
        url.set_fragment(None);
        Self { method: method.trim().to_ascii_uppercase(), url, mode }
    }

    /// Subresource GET.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Cors)
    }

    /// Top-level document GET.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, RequestMode::Navigate)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Resolve a possibly-relative URL against `base`.
///
/// Resolution steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join against `base` (absolute inputs replace it entirely)
/// 3. Require an http or https scheme
/// 4. Remove fragment (#...)
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match resolved.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    resolved.set_fragment(None);

    Ok(resolved)
}

/// Whether two URLs share scheme, host, and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn test_resolve_dot_relative() {
        let url = resolve(&origin(), "./index.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/index.html");
    }

    #[test]
    fn test_resolve_root_forms_agree() {
        assert_eq!(resolve(&origin(), "./").unwrap(), resolve(&origin(), "/").unwrap());
    }

    #[test]
    fn test_resolve_absolute_replaces_base() {
        let url = resolve(&origin(), "https://unpkg.com/vue@3/dist/vue.global.js").unwrap();
        assert_eq!(url.host_str(), Some("unpkg.com"));
        assert_eq!(url.path(), "/vue@3/dist/vue.global.js");
    }

    #[test]
    fn test_resolve_keeps_query_drops_fragment() {
        let url = resolve(&origin(), "/app.js?v=2#top").unwrap();
        assert_eq!(url.query(), Some("v=2"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_request_normalizes_method_and_fragment() {
        let url = Url::parse("http://localhost:8080/trips#42").unwrap();
        let request = Request::new("post", url, RequestMode::SameOrigin);
        assert_eq!(request.method, "POST");
        assert!(!request.is_get());
        assert_eq!(request.url.as_str(), "http://localhost:8080/trips");
    }

    #[test]
    fn test_navigation_flag() {
        let url = Url::parse("http://localhost:8080/trips/7").unwrap();
        assert!(Request::navigate(url.clone()).is_navigation());
        assert!(!Request::get(url).is_navigation());
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("http://localhost:8080/a").unwrap();
        let b = Url::parse("http://localhost:8080/b?x=1").unwrap();
        let c = Url::parse("https://localhost:8080/a").unwrap();
        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &c));
    }
}
