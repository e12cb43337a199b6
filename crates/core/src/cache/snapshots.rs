//! Response snapshot CRUD operations.
//!
//! Provides functions for storing, matching, listing, and deleting
//! response snapshots inside a named cache.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::request::Request;

/// Response type tag, as the network layer classified it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response with CORS permission.
    Cors,
    /// Cross-origin response without CORS permission; content is not inspectable.
    Opaque,
    Default,
    Error,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Default => "default",
            ResponseType::Error => "error",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            "default" => Ok(ResponseType::Default),
            "error" => Ok(ResponseType::Error),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// A fully buffered response.
///
/// The body is reference counted, so cloning a snapshot to both persist it
/// and hand it to the caller does not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Snapshot {
    pub fn new(url: impl Into<String>, status: u16, response_type: ResponseType, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: String::new(),
            response_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether runtime caching may store this response: status exactly 200
    /// and a basic, cors, or opaque type.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
            && matches!(self.response_type, ResponseType::Basic | ResponseType::Cors | ResponseType::Opaque)
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A snapshot prepared for insertion.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    headers_json: String,
    snapshot: Snapshot,
}

impl EntryRow {
    fn new(request: &Request, snapshot: &Snapshot) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!(
                "only GET requests can be cached, got {} {}",
                request.method, request.url
            )));
        }

        let headers_json = serde_json::to_string(&snapshot.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;

        Ok(Self {
            key_hash: compute_cache_key(&request.method, request.url.as_str()),
            method: request.method.clone(),
            url: request.url.to_string(),
            headers_json,
            snapshot: snapshot.clone(),
        })
    }

    fn insert(&self, conn: &rusqlite::Connection, cache: &str, stored_at: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO entries (
                cache_name, key_hash, method, url, response_url,
                status, status_text, response_type, headers_json, body, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                response_url = excluded.response_url,
                status = excluded.status,
                status_text = excluded.status_text,
                response_type = excluded.response_type,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                cache,
                &self.key_hash,
                &self.method,
                &self.url,
                &self.snapshot.url,
                self.snapshot.status as i64,
                &self.snapshot.status_text,
                self.snapshot.response_type.as_str(),
                &self.headers_json,
                self.snapshot.body.as_ref(),
                stored_at,
            ],
        )?;
        Ok(())
    }
}

/// Undecoded snapshot columns.
struct RawSnapshot {
    url: String,
    status: u16,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
}

impl RawSnapshot {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            status: row.get(1)?,
            status_text: row.get(2)?,
            response_type: row.get(3)?,
            headers_json: row.get(4)?,
            body: row.get(5)?,
        })
    }

    fn decode(self) -> Result<Snapshot, Error> {
        let headers = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("headers for {}: {e}", self.url)))?;
        Ok(Snapshot {
            url: self.url,
            status: self.status,
            status_text: self.status_text,
            response_type: self.response_type.parse()?,
            headers,
            body: Bytes::from(self.body),
        })
    }
}

impl CacheDb {
    /// Insert or replace the snapshot for `request` in `cache`.
    ///
    /// Only GET requests are accepted. The cache must exist.
    pub async fn put_entry(&self, cache: &str, request: &Request, snapshot: &Snapshot) -> Result<(), Error> {
        self.put_entries(cache, &[(request.clone(), snapshot.clone())]).await
    }

    /// Insert several snapshots in one transaction; either all land or none do.
    pub async fn put_entries(&self, cache: &str, entries: &[(Request, Snapshot)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(request, snapshot)| EntryRow::new(request, snapshot))
            .collect::<Result<Vec<_>, _>>()?;
        let cache = cache.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                for row in &rows {
                    row.insert(&tx, &cache, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the snapshot stored for `request` in `cache`.
    ///
    /// Returns None on a miss, and for any non-GET request.
    pub async fn match_entry(&self, cache: &str, request: &Request) -> Result<Option<Snapshot>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let cache = cache.to_string();
        let key_hash = compute_cache_key(&request.method, request.url.as_str());

        self.conn
            .call(move |conn| -> Result<Option<RawSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT response_url, status, status_text, response_type, headers_json, body
                    FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                )?;

                match stmt.query_row(params![cache, key_hash], RawSnapshot::from_row) {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?
            .map(RawSnapshot::decode)
            .transpose()
    }

    /// Match `request` against every cache, oldest cache first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Snapshot>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key_hash = compute_cache_key(&request.method, request.url.as_str());

        self.conn
            .call(move |conn| -> Result<Option<RawSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.response_url, e.status, e.status_text, e.response_type, e.headers_json, e.body
                    FROM entries e JOIN caches c ON c.name = e.cache_name
                    WHERE e.key_hash = ?1
                    ORDER BY c.id ASC
                    LIMIT 1",
                )?;

                match stmt.query_row(params![key_hash], RawSnapshot::from_row) {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?
            .map(RawSnapshot::decode)
            .transpose()
    }

    /// Request URLs stored in `cache`, in insertion order.
    pub async fn entry_urls(&self, cache: &str) -> Result<Vec<String>, Error> {
        let cache = cache.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE cache_name = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![cache], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the snapshot for `request` from `cache`.
    ///
    /// Returns whether an entry was removed.
    pub async fn delete_entry(&self, cache: &str, request: &Request) -> Result<bool, Error> {
        let cache = cache.to_string();
        let key_hash = compute_cache_key(&request.method, request.url.as_str());
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![cache, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
