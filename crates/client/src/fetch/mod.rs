//! HTTP fetch pipeline backing the offline cache manager.
//!
//! ### Response classification
//! - Same origin as the application: `basic`
//! - Cross-origin request in `no-cors` mode: `opaque`
//! - Any other cross-origin request: `cors`
//!
//! ### Failure model
//! - Any HTTP status is a successful fetch; the manager decides what to cache.
//! - Transport failures (DNS, refused connection, reset, timeout) are
//!   `Error::Network`.
//! - No timeout unless one is configured.

use bytes::Bytes;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};
use url::Url;

use swcache_core::request::same_origin;
use swcache_core::{AppConfig, ConfigError, Error, Network, Request, RequestMode, ResponseType, Snapshot};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin of the application; decides basic vs cors/opaque.
    pub origin: Url,

    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Fetch settings derived from application configuration.
    pub fn from_app(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: config.origin_url()?,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        })
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            origin: Url::parse(&app.origin).expect("default origin is a valid URL"),
            user_agent: app.user_agent,
            timeout: None,
            max_redirects: app.max_redirects,
        }
    }
}

/// Classify a response the way a browser would tag it for a page on `origin`.
pub fn classify(origin: &Url, request: &Request, final_url: &Url) -> ResponseType {
    if same_origin(origin, &request.url) && same_origin(origin, final_url) {
        ResponseType::Basic
    } else if request.mode == RequestMode::NoCors {
        ResponseType::Opaque
    } else {
        ResponseType::Cors
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Snapshot, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let response = self
            .http
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} {}: {}", request.method, request.url, e)))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        let response_type = classify(&self.config.origin, request, &final_url);

        tracing::debug!(
            "fetched {} -> {} {} ({}) in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            response_type,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Snapshot {
            url: final_url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            response_type,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(raw: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(raw.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client_for(origin: &Url) -> FetchClient {
        FetchClient::new(FetchConfig { origin: origin.clone(), ..Default::default() }).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.origin.as_str(), "http://localhost:8080/");
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app() {
        let app = AppConfig { timeout_ms: Some(1_500), origin: "https://viajeros.app".into(), ..Default::default() };
        let config = FetchConfig::from_app(&app).unwrap();
        assert_eq!(config.origin.host_str(), Some("viajeros.app"));
        assert_eq!(config.timeout, Some(Duration::from_millis(1_500)));
    }

    #[test]
    fn test_classify() {
        let origin = Url::parse("http://localhost:8080").unwrap();
        let local = Url::parse("http://localhost:8080/app.js").unwrap();
        let cdn = Url::parse("https://unpkg.com/vue@3/dist/vue.global.js").unwrap();

        assert_eq!(classify(&origin, &Request::get(local.clone()), &local), ResponseType::Basic);
        assert_eq!(classify(&origin, &Request::get(cdn.clone()), &cdn), ResponseType::Cors);
        assert_eq!(
            classify(&origin, &Request::new("GET", cdn.clone(), RequestMode::NoCors), &cdn),
            ResponseType::Opaque
        );
        // Same-origin request redirected off-origin is no longer basic.
        assert_eq!(classify(&origin, &Request::get(local), &cdn), ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_same_origin_response() {
        let origin = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: 6\r\nConnection: close\r\n\r\nbody{}",
        )
        .await;
        let client = client_for(&origin);

        let snapshot = client.fetch(&Request::get(origin.join("/styles.css").unwrap())).await.unwrap();
        assert_eq!(snapshot.status, 200);
        assert_eq!(snapshot.status_text, "OK");
        assert_eq!(snapshot.response_type, ResponseType::Basic);
        assert_eq!(snapshot.header("content-type"), Some("text/css"));
        assert_eq!(snapshot.body_text(), "body{}");
        assert!(snapshot.is_cacheable());
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_not_a_failure() {
        let origin = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let client = client_for(&origin);

        let snapshot = client.fetch(&Request::get(origin.join("/missing.png").unwrap())).await.unwrap();
        assert_eq!(snapshot.status, 404);
        assert!(!snapshot.is_cacheable());
    }

    #[tokio::test]
    async fn test_fetch_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let origin = Url::parse(&format!("http://{addr}")).unwrap();
        let client = client_for(&origin);
        let result = client.fetch(&Request::get(origin.join("/app.js").unwrap())).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_invalid_method() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let request = Request::new("BAD METHOD", Url::parse("http://localhost:8080/").unwrap(), RequestMode::Cors);
        let result = client.fetch(&request).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
