//! Named cache operations.
//!
//! A cache store is identified by its version name. Opening creates it on
//! first use; deleting it drops every entry it holds.

use tokio_rusqlite::params;

use super::connection::CacheDb;
use super::snapshots::Snapshot;
use crate::Error;
use crate::request::Request;

/// Handle to one named cache.
#[derive(Clone, Debug)]
pub struct Cache {
    db: CacheDb,
    name: String,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn put(&self, request: &Request, snapshot: &Snapshot) -> Result<(), Error> {
        self.db.put_entry(&self.name, request, snapshot).await
    }

    /// Store every entry or none of them.
    pub async fn put_all(&self, entries: &[(Request, Snapshot)]) -> Result<(), Error> {
        self.db.put_entries(&self.name, entries).await
    }

    pub async fn match_request(&self, request: &Request) -> Result<Option<Snapshot>, Error> {
        self.db.match_entry(&self.name, request).await
    }

    /// Request URLs held by this cache.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.db.entry_urls(&self.name).await
    }

    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        self.db.delete_entry(&self.name, request).await
    }
}

impl CacheDb {
    /// Open the named cache, creating it if absent.
    pub async fn open_cache(&self, name: &str) -> Result<Cache, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Cache { db: self.clone(), name: name.to_string() })
    }

    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })
                    .map_err(Error::from)?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all caches, in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the named cache and all its entries.
    ///
    /// Returns whether the cache existed.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseType;
    use url::Url;

    #[tokio::test]
    async fn test_open_creates_once() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has_cache("viajeros-v5").await.unwrap());

        db.open_cache("viajeros-v5").await.unwrap();
        db.open_cache("viajeros-v5").await.unwrap();

        assert!(db.has_cache("viajeros-v5").await.unwrap());
        assert_eq!(db.cache_names().await.unwrap(), vec!["viajeros-v5".to_string()]);
    }

    #[tokio::test]
    async fn test_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["viajeros-v3", "viajeros-v2", "viajeros-v5"] {
            db.open_cache(name).await.unwrap();
        }
        assert_eq!(db.cache_names().await.unwrap(), vec!["viajeros-v3", "viajeros-v2", "viajeros-v5"]);
    }

    #[tokio::test]
    async fn test_delete_cache_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = db.open_cache("viajeros-v2").await.unwrap();
        let request = Request::get(Url::parse("http://localhost:8080/index.html").unwrap());
        cache
            .put(&request, &Snapshot::new(request.url.as_str(), 200, ResponseType::Basic, "<html>"))
            .await
            .unwrap();

        assert!(db.delete_cache("viajeros-v2").await.unwrap());
        assert!(!db.delete_cache("viajeros-v2").await.unwrap());
        assert!(!db.has_cache("viajeros-v2").await.unwrap());
        assert!(db.match_any(&request).await.unwrap().is_none());

        // Reopening yields an empty store, not the old entries.
        let reopened = db.open_cache("viajeros-v2").await.unwrap();
        assert!(reopened.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = db.open_cache("viajeros-v5").await.unwrap();
        assert_eq!(cache.name(), "viajeros-v5");

        let request = Request::get(Url::parse("http://localhost:8080/manifest.json").unwrap());
        let snapshot = Snapshot::new(request.url.as_str(), 200, ResponseType::Basic, "{}");
        cache.put_all(&[(request.clone(), snapshot.clone())]).await.unwrap();

        assert_eq!(cache.match_request(&request).await.unwrap(), Some(snapshot));
        assert_eq!(cache.keys().await.unwrap(), vec!["http://localhost:8080/manifest.json"]);
        assert!(cache.delete(&request).await.unwrap());
    }
}
