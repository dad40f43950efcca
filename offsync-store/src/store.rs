//! Trait for versioned bucket storage. Buckets map canonicalized request
//! keys to stored responses; backends must make each operation atomic from
//! the caller's perspective.

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{CacheEntry, CachedResponse, RequestKey};
use crate::StoreError;

/// Predicate deciding which buckets survive an eviction sweep.
pub type BucketPredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Look up an entry. `Ok(None)` when the bucket or the key is absent.
    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<CacheEntry>, StoreError>;

    /// Store a response under `key`, replacing any prior entry whole.
    /// Only successful (2xx) responses are accepted; the bucket is created
    /// on first write.
    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), StoreError>;

    /// Remove one entry. Returns whether an entry existed.
    async fn delete(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<bool, StoreError>;

    /// Point-in-time snapshot of the keys in a bucket.
    async fn keys(&self, bucket: &str) -> Result<Vec<RequestKey>, StoreError>;

    /// Names of all live buckets.
    async fn buckets(&self) -> Result<Vec<String>, StoreError>;

    /// Drop every bucket the predicate rejects. Returns the evicted names.
    async fn evict_buckets(
        &self,
        keep: BucketPredicate<'_>,
    ) -> Result<Vec<String>, StoreError>;
}

pub type AbstractBucketStore = Arc<dyn BucketStore>;

/// Guard for the 2xx-only invariant, shared by backends.
pub(crate) fn ensure_storable(
    key: &RequestKey,
    response: &CachedResponse,
) -> Result<(), StoreError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(StoreError::NotStorable {
            status: response.status,
            key: key.canonical(),
        })
    }
}
