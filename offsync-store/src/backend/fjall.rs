//! Fjall-backed bucket store (durable backend). Survives process restarts,
//! which is what makes cached responses usable on a cold offline start.
//!
//! Layout:
//! - `entries`: `bucket \0 canonical-key` -> serialized entry
//! - `buckets`: bucket name -> empty value
//!
//! Bucket names are version tags plus a suffix and never contain NUL, so
//! the composite key is unambiguous.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};

use crate::store::{ensure_storable, BucketPredicate, BucketStore};
use crate::types::{CacheEntry, CachedResponse, RequestKey};
use crate::StoreError;

const KEY_SEP: u8 = 0x00;

pub struct FjallBucketStore {
    db: Keyspace,
    entries: PartitionHandle,
    buckets: PartitionHandle,
    // Serialize compound operations (eviction scans) against writes.
    lock: Mutex<()>,
}

impl FjallBucketStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let keyspace = Config::new(path).open()?;
        let entries = keyspace
            .open_partition("entries", PartitionCreateOptions::default())?;
        let buckets = keyspace
            .open_partition("buckets", PartitionCreateOptions::default())?;

        Ok(Self {
            db: keyspace,
            entries,
            buckets,
            lock: Mutex::new(()),
        })
    }

    fn entry_key(bucket: &str, key: &RequestKey) -> Vec<u8> {
        let canonical = key.canonical();
        let mut out = Vec::with_capacity(bucket.len() + 1 + canonical.len());
        out.extend_from_slice(bucket.as_bytes());
        out.push(KEY_SEP);
        out.extend_from_slice(canonical.as_bytes());
        out
    }

    fn bucket_prefix(bucket: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(bucket.len() + 1);
        out.extend_from_slice(bucket.as_bytes());
        out.push(KEY_SEP);
        out
    }

    fn serialize_entry(entry: &CacheEntry) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(entry)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn deserialize_entry(data: &[u8]) -> Result<CacheEntry, StoreError> {
        serde_json::from_slice(data)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BucketStore for FjallBucketStore {
    async fn get(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let composite = Self::entry_key(bucket, key);
        match self.entries.get(composite)? {
            Some(bytes) => Ok(Some(Self::deserialize_entry(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), StoreError> {
        ensure_storable(key, &response)?;
        let entry = CacheEntry::new(key.clone(), response);
        let bytes = Self::serialize_entry(&entry)?;

        let _guard = self.guard();
        self.entries.insert(Self::entry_key(bucket, key), &bytes)?;
        self.buckets.insert(bucket.as_bytes(), &[] as &[u8])?;

        // Best-effort sync to disk for durability.
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn delete(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> Result<bool, StoreError> {
        let composite = Self::entry_key(bucket, key);

        let _guard = self.guard();
        let existed = self.entries.get(&composite)?.is_some();
        if existed {
            self.entries.remove(composite)?;
            self.db.persist(PersistMode::SyncAll)?;
        }
        Ok(existed)
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<RequestKey>, StoreError> {
        let mut keys = Vec::new();
        for item in self.entries.prefix(Self::bucket_prefix(bucket)) {
            let (_, value) = item?;
            keys.push(Self::deserialize_entry(&value)?.key);
        }
        Ok(keys)
    }

    async fn buckets(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for item in self.buckets.iter() {
            let (name, _) = item?;
            names.push(String::from_utf8_lossy(&name).into_owned());
        }
        Ok(names)
    }

    async fn evict_buckets(
        &self,
        keep: BucketPredicate<'_>,
    ) -> Result<Vec<String>, StoreError> {
        let _guard = self.guard();

        let mut names = Vec::new();
        for item in self.buckets.iter() {
            let (name, _) = item?;
            names.push(String::from_utf8_lossy(&name).into_owned());
        }

        let mut evicted = Vec::new();
        for name in names {
            if keep(&name) {
                continue;
            }
            tracing::debug!(bucket = %name, "evicting bucket");
            let mut stale = Vec::new();
            for item in self.entries.prefix(Self::bucket_prefix(&name)) {
                let (key, _) = item?;
                stale.push(key.as_ref().to_vec());
            }
            for key in stale {
                self.entries.remove(key)?;
            }
            self.buckets.remove(name.as_bytes())?;
            evicted.push(name);
        }

        if !evicted.is_empty() {
            self.db.persist(PersistMode::SyncAll)?;
        }
        Ok(evicted)
    }
}

impl std::fmt::Debug for FjallBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FjallBucketStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;
    use tempfile::tempdir;

    fn key(url: &str) -> RequestKey {
        RequestKey::new(Method::Get, url)
    }

    fn ok_response(body: &str) -> CachedResponse {
        CachedResponse::new(200).with_body(body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn put_get_delete() {
        let dir = tempdir().unwrap();
        let store = FjallBucketStore::open(dir.path()).unwrap();
        let k = key("https://x.test/app.js");

        store.put("v1-static", &k, ok_response("alert(1)")).await.unwrap();
        let entry = store.get("v1-static", &k).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "alert(1)");

        assert!(store.delete("v1-static", &k).await.unwrap());
        assert!(!store.delete("v1-static", &k).await.unwrap());
        assert!(store.get("v1-static", &k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempdir().unwrap();
        let k = key("https://x.test/index.html");

        {
            let store = FjallBucketStore::open(dir.path()).unwrap();
            store
                .put("v1-static", &k, ok_response("<html>"))
                .await
                .unwrap();
        }

        let store = FjallBucketStore::open(dir.path()).unwrap();
        let entry = store.get("v1-static", &k).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "<html>");
        assert_eq!(store.buckets().await.unwrap(), vec!["v1-static"]);
    }

    #[tokio::test]
    async fn non_success_rejected() {
        let dir = tempdir().unwrap();
        let store = FjallBucketStore::open(dir.path()).unwrap();
        let k = key("https://x.test/api/balance");

        let res = store.put("v1-dynamic", &k, CachedResponse::new(404)).await;
        assert!(matches!(res, Err(StoreError::NotStorable { status: 404, .. })));
    }

    #[tokio::test]
    async fn evict_drops_entries_and_name() {
        let dir = tempdir().unwrap();
        let store = FjallBucketStore::open(dir.path()).unwrap();
        let k = key("https://x.test/");

        store.put("v1-static", &k, ok_response("a")).await.unwrap();
        store.put("v2-static", &k, ok_response("b")).await.unwrap();

        let evicted = store
            .evict_buckets(&|name| name.starts_with("v2-"))
            .await
            .unwrap();
        assert_eq!(evicted, vec!["v1-static"]);
        assert!(store.get("v1-static", &k).await.unwrap().is_none());
        assert!(store.keys("v1-static").await.unwrap().is_empty());
        assert_eq!(store.buckets().await.unwrap(), vec!["v2-static"]);
    }

    #[tokio::test]
    async fn keys_are_scoped_to_bucket() {
        let dir = tempdir().unwrap();
        let store = FjallBucketStore::open(dir.path()).unwrap();

        store
            .put("v1-static", &key("https://x.test/a"), ok_response("a"))
            .await
            .unwrap();
        store
            .put("v1-dynamic", &key("https://x.test/b"), ok_response("b"))
            .await
            .unwrap();

        let keys = store.keys("v1-static").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].url, "https://x.test/a");
    }
}
