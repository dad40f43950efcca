//! In-memory implementation of the bucket store. Buckets spring into
//! existence on first write and everything is gone when the process exits,
//! which is what tests and short-lived embedders want.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::{ensure_storable, BucketPredicate, BucketStore};
use crate::types::{CacheEntry, CachedResponse, RequestKey};
use crate::StoreError;

pub struct MemoryBucketStore {
    buckets: Mutex<HashMap<String, HashMap<String, CacheEntry>>>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBucketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(buckets
            .get(bucket)
            .and_then(|entries| entries.get(&key.canonical()))
            .cloned())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), StoreError> {
        ensure_storable(key, &response)?;
        let entry = CacheEntry::new(key.clone(), response);
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.canonical(), entry);
        Ok(())
    }

    async fn delete(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<bool, StoreError> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(buckets
            .get_mut(bucket)
            .map(|entries| entries.remove(&key.canonical()).is_some())
            .unwrap_or(false))
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<RequestKey>, StoreError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(buckets
            .get(bucket)
            .map(|entries| entries.values().map(|e| e.key.clone()).collect())
            .unwrap_or_default())
    }

    async fn buckets(&self) -> Result<Vec<String>, StoreError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(buckets.keys().cloned().collect())
    }

    async fn evict_buckets(
        &self,
        keep: BucketPredicate<'_>,
    ) -> Result<Vec<String>, StoreError> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let evicted: Vec<String> = buckets
            .keys()
            .filter(|name| !keep(name))
            .cloned()
            .collect();
        for name in &evicted {
            tracing::debug!(bucket = %name, "evicting bucket");
            buckets.remove(name);
        }
        Ok(evicted)
    }
}

impl std::fmt::Debug for MemoryBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buckets = self.buckets.lock().unwrap();
        f.debug_struct("MemoryBucketStore")
            .field("bucket_count", &buckets.len())
            .finish()
    }
}
