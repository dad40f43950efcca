//! Shared request/response value types.
//!
//! Everything the engine moves around is plain data: a captured request is
//! enough to replay the call, a cached response is enough to answer it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// HTTP method of a captured request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Non-idempotent methods; these become replay-queue candidates when
    /// they fail due to connectivity.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Method::Post | Method::Put | Method::Patch | Method::Delete
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(StoreError::UnknownMethod(other.to_string())),
        }
    }
}

/// A request captured at the engine boundary: method, absolute URL, headers
/// and body, i.e. everything needed to send (or re-send) it through the
/// network transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl CapturedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Cache key addressing this request (no vary headers).
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method, self.url.clone())
    }
}

/// Canonicalized cache key: method + absolute URL + the headers that
/// participate in the key (sorted, lowercase names; empty by default).
///
/// Two requests with the same key address the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
    pub vary: Vec<(String, String)>,
}

impl RequestKey {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            vary: Vec::new(),
        }
    }

    /// Add a header to the key. Names are lowercased and kept sorted so the
    /// canonical form does not depend on insertion order.
    pub fn with_vary(
        mut self,
        name: impl AsRef<str>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        let at = self
            .vary
            .binary_search_by(|(n, _)| n.as_str().cmp(&name))
            .unwrap_or_else(|i| i);
        self.vary.insert(at, (name, value));
        self
    }

    /// Deterministic storage key.
    pub fn canonical(&self) -> String {
        let mut out = format!("{} {}", self.method, self.url);
        for (name, value) in &self.vary {
            out.push('\n');
            out.push_str(name);
            out.push(':');
            out.push_str(value);
        }
        out
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// A stored response: status line, headers and raw body bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// 2xx test; only successful responses are storable.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A single bucket entry. Immutable once stored; a later put for the same
/// key replaces the entry whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub response: CachedResponse,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: RequestKey, response: CachedResponse) -> Self {
        Self {
            key,
            response,
            stored_at: Utc::now(),
        }
    }
}

/// Identifies one deployed generation of cache buckets.
///
/// A tag owns exactly two buckets, `{tag}-static` and `{tag}-dynamic`;
/// activation evicts every bucket the current tag does not own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn static_bucket(&self) -> String {
        format!("{}-static", self.0)
    }

    pub fn dynamic_bucket(&self) -> String {
        format!("{}-dynamic", self.0)
    }

    /// True if the bucket belongs to this generation.
    pub fn owns(&self, bucket: &str) -> bool {
        bucket == self.static_bucket() || bucket == self.dynamic_bucket()
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
