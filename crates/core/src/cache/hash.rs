//! Request-keyed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// `url` is expected to be absolute with its fragment already removed.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "http://localhost:8080/index.html");
        let hash2 = compute_cache_key("GET", "http://localhost:8080/index.html");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        let get = compute_cache_key("GET", "http://localhost:8080/api/trips");
        let post = compute_cache_key("POST", "http://localhost:8080/api/trips");
        assert_ne!(get, post);
    }

    #[test]
    fn test_hash_different_query() {
        let a = compute_cache_key("GET", "http://localhost:8080/app.js?v=1");
        let b = compute_cache_key("GET", "http://localhost:8080/app.js?v=2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "http://localhost:8080/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
