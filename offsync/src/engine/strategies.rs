//! The three caching strategy executors.
//!
//! Shared guarantee: a cacheable GET flow never surfaces a bare transport
//! error. Failures degrade to a cached entry or to a synthesized offline
//! response the caller can render.

use std::sync::Arc;

use tracing::{debug, warn};

use super::fetch::{FetchEngine, FetchSource, Fetched};
use super::EngineError;
use offsync_router::Strategy;
use offsync_store::{CacheEntry, CachedResponse, CapturedRequest, RequestKey};

/// Placeholder returned by cache-first when nothing is cached and the
/// network is down.
pub(crate) fn offline_placeholder() -> CachedResponse {
    CachedResponse::new(503)
        .with_header("content-type", "text/plain")
        .with_body(&b"offline"[..])
}

/// Structured offline payload for API reads, JSON so the caller's parsing
/// path stays alive.
pub(crate) fn offline_payload() -> CachedResponse {
    CachedResponse::new(503)
        .with_header("content-type", "application/json")
        .with_body(&br#"{"error":"offline","offline":true}"#[..])
}

/// Offline payload for a mutation captured for replay; carries the queue
/// sequence so the caller can correlate later.
pub(crate) fn queued_payload(seq: u64) -> CachedResponse {
    let body =
        format!(r#"{{"error":"offline","offline":true,"queued_seq":{seq}}}"#);
    CachedResponse::new(503)
        .with_header("content-type", "application/json")
        .with_body(body.into_bytes())
}

impl FetchEngine {
    /// Look a key up across this generation's buckets, static first (the
    /// browser equivalent searches every cache).
    async fn lookup_any(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CacheEntry>, EngineError> {
        if let Some(entry) =
            self.store.get(&self.tag.static_bucket(), key).await?
        {
            return Ok(Some(entry));
        }
        Ok(self.store.get(&self.tag.dynamic_bucket(), key).await?)
    }

    /// Serve from cache, hit the network only on a miss. Connectivity
    /// failure degrades to the configured offline page, then to a plain
    /// 503 placeholder.
    pub(crate) async fn cache_first(
        &self,
        request: &CapturedRequest,
    ) -> Result<Fetched, EngineError> {
        let key = request.key();
        if let Some(entry) = self.lookup_any(&key).await? {
            return Ok(Fetched {
                response: entry.response,
                source: FetchSource::Cache,
                strategy: Strategy::CacheFirst,
            });
        }

        match self.transport.send(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store
                        .put(&self.tag.static_bucket(), &key, response.clone())
                        .await?;
                }
                Ok(Fetched {
                    response,
                    source: FetchSource::Network,
                    strategy: Strategy::CacheFirst,
                })
            }
            Err(err) if err.is_connectivity() => {
                debug!(url = %request.url, error = %err, "cache-first: offline, no entry");
                if let Some(page) = &self.options.offline_page {
                    if let Some(entry) =
                        self.store.get(&self.tag.static_bucket(), page).await?
                    {
                        return Ok(Fetched {
                            response: entry.response,
                            source: FetchSource::Offline,
                            strategy: Strategy::CacheFirst,
                        });
                    }
                }
                Ok(Fetched {
                    response: offline_placeholder(),
                    source: FetchSource::Offline,
                    strategy: Strategy::CacheFirst,
                })
            }
            Err(err) => Err(EngineError::Transport(err)),
        }
    }

    /// Try the network first and keep the dynamic bucket warm; fall back
    /// to cache, then to a structured offline payload.
    pub(crate) async fn network_first(
        &self,
        request: &CapturedRequest,
    ) -> Result<Fetched, EngineError> {
        let key = request.key();
        match self.transport.send(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store
                        .put(&self.tag.dynamic_bucket(), &key, response.clone())
                        .await?;
                }
                Ok(Fetched {
                    response,
                    source: FetchSource::Network,
                    strategy: Strategy::NetworkFirst,
                })
            }
            Err(err) if err.is_connectivity() => {
                if let Some(entry) = self.lookup_any(&key).await? {
                    debug!(url = %request.url, "network-first: serving cached entry");
                    return Ok(Fetched {
                        response: entry.response,
                        source: FetchSource::Cache,
                        strategy: Strategy::NetworkFirst,
                    });
                }
                debug!(url = %request.url, "network-first: offline, no entry");
                Ok(Fetched {
                    response: offline_payload(),
                    source: FetchSource::Offline,
                    strategy: Strategy::NetworkFirst,
                })
            }
            Err(err) => Err(EngineError::Transport(err)),
        }
    }

    /// Return the cached entry immediately and refresh it in the
    /// background; with no cached entry the network result (or its error)
    /// is the answer.
    pub(crate) async fn stale_while_revalidate(
        &self,
        request: &CapturedRequest,
    ) -> Result<Fetched, EngineError> {
        let key = request.key();
        if let Some(entry) = self.lookup_any(&key).await? {
            self.spawn_refresh(request.clone(), key);
            return Ok(Fetched {
                response: entry.response,
                source: FetchSource::Cache,
                strategy: Strategy::StaleWhileRevalidate,
            });
        }

        let response = self.transport.send(request).await?;
        if response.is_success() {
            self.store
                .put(&self.tag.dynamic_bucket(), &key, response.clone())
                .await?;
        }
        Ok(Fetched {
            response,
            source: FetchSource::Network,
            strategy: Strategy::StaleWhileRevalidate,
        })
    }

    /// Detached refresh. The task finishes its cache write even if the
    /// caller is gone; failures are logged and dropped so the response
    /// already returned is never affected.
    fn spawn_refresh(&self, request: CapturedRequest, key: RequestKey) {
        let store = Arc::clone(&self.store);
        let transport = Arc::clone(&self.transport);
        let bucket = self.tag.dynamic_bucket();
        tokio::spawn(async move {
            match transport.send(&request).await {
                Ok(response) if response.is_success() => {
                    if let Err(err) = store.put(&bucket, &key, response).await {
                        warn!(key = %key, error = %err, "background refresh: cache write failed");
                    }
                }
                Ok(response) => {
                    debug!(
                        key = %key,
                        status = response.status,
                        "background refresh: non-success response dropped"
                    );
                }
                Err(err) => {
                    debug!(key = %key, error = %err, "background refresh failed");
                }
            }
        });
    }
}
