//! Fjall-backed mutation queue (durable backend). Writes queued while
//! offline survive a restart, so nothing is lost if the app closes before
//! connectivity returns.
//!
//! Layout:
//! - `queue`: seq (u64, big-endian bytes) -> serialized mutation
//!
//! Big-endian keys sort numerically, so key order is replay order. The
//! next sequence number is recovered from the last key at open time.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};

use crate::mutation::QueuedMutation;
use crate::{MutationQueue, MutationSerializer, QueueError};
use offsync_store::CapturedRequest;

pub struct FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    db: Keyspace,
    queue: PartitionHandle,
    next_seq: AtomicU64,
    // Serialize enqueue/ack/update to keep ordering simple.
    lock: Mutex<()>,
    _marker: PhantomData<S>,
}

impl<S> FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let keyspace = Config::new(path).open()?;
        let queue =
            keyspace.open_partition("queue", PartitionCreateOptions::default())?;

        let next_seq = match queue.last_key_value()? {
            Some((key, _)) => Self::seq_from_bytes(&key)? + 1,
            None => 1,
        };

        Ok(Self {
            db: keyspace,
            queue,
            next_seq: AtomicU64::new(next_seq),
            lock: Mutex::new(()),
            _marker: PhantomData,
        })
    }

    fn seq_to_bytes(seq: u64) -> [u8; 8] {
        seq.to_be_bytes()
    }

    fn seq_from_bytes(bytes: &[u8]) -> Result<u64, QueueError> {
        let bytes: [u8; 8] = bytes.try_into().map_err(|_| {
            QueueError::Backend("invalid sequence key length".to_string())
        })?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<S> MutationQueue for FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    async fn enqueue(
        &self,
        request: CapturedRequest,
    ) -> Result<QueuedMutation, QueueError> {
        let _guard = self.guard();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let mutation = QueuedMutation::new(seq, request);
        let bytes = S::serialize_mutation(&mutation)?;

        self.queue.insert(Self::seq_to_bytes(seq), &bytes)?;

        // Best-effort sync to disk for durability.
        self.db.persist(PersistMode::SyncAll)?;
        tracing::debug!(seq, url = %mutation.request.url, "mutation enqueued");
        Ok(mutation)
    }

    async fn front(&self) -> Result<QueuedMutation, QueueError> {
        let Some((_, bytes)) = self.queue.first_key_value()? else {
            return Err(QueueError::Empty);
        };
        S::deserialize_mutation(&bytes)
    }

    async fn ack(&self, seq: u64) -> Result<(), QueueError> {
        let _guard = self.guard();
        let key = Self::seq_to_bytes(seq);
        if self.queue.get(key)?.is_none() {
            return Err(QueueError::NotFound(seq));
        }
        self.queue.remove(key)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn update(&self, mutation: &QueuedMutation) -> Result<(), QueueError> {
        let _guard = self.guard();
        let key = Self::seq_to_bytes(mutation.seq);
        if self.queue.get(key)?.is_none() {
            return Err(QueueError::NotFound(mutation.seq));
        }
        let bytes = S::serialize_mutation(mutation)?;
        self.queue.insert(key, &bytes)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<QueuedMutation>, QueueError> {
        let mut out = Vec::new();
        for item in self.queue.iter() {
            let (_, bytes) = item?;
            out.push(S::deserialize_mutation(&bytes)?);
        }
        Ok(out)
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let mut n = 0;
        for item in self.queue.iter() {
            item?;
            n += 1;
        }
        Ok(n)
    }
}

impl<S> std::fmt::Debug for FjallMutationQueue<S>
where
    S: MutationSerializer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FjallMutationQueue").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonSerializer;
    use offsync_store::Method;
    use tempfile::tempdir;

    fn post(url: &str) -> CapturedRequest {
        CapturedRequest::new(Method::Post, url).with_body(&b"{}"[..])
    }

    fn open_queue(path: &Path) -> FjallMutationQueue<JsonSerializer> {
        FjallMutationQueue::open(path).unwrap()
    }

    #[tokio::test]
    async fn fifo_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let queue = open_queue(dir.path());
            queue.enqueue(post("https://x.test/api/transactions")).await.unwrap();
            queue.enqueue(post("https://x.test/api/budgets")).await.unwrap();
        }

        let queue = open_queue(dir.path());
        assert_eq!(queue.len().await.unwrap(), 2);

        let front = queue.front().await.unwrap();
        assert_eq!(front.seq, 1);
        assert_eq!(front.request.url, "https://x.test/api/transactions");
    }

    #[tokio::test]
    async fn sequence_continues_after_reopen() {
        let dir = tempdir().unwrap();

        {
            let queue = open_queue(dir.path());
            queue.enqueue(post("https://x.test/api/transactions")).await.unwrap();
            queue.enqueue(post("https://x.test/api/budgets")).await.unwrap();
        }

        let queue = open_queue(dir.path());
        let third = queue.enqueue(post("https://x.test/api/goals")).await.unwrap();
        assert_eq!(third.seq, 3);
    }

    #[tokio::test]
    async fn ack_removes_only_target() {
        let dir = tempdir().unwrap();
        let queue = open_queue(dir.path());

        queue.enqueue(post("https://x.test/api/transactions")).await.unwrap();
        queue.enqueue(post("https://x.test/api/budgets")).await.unwrap();

        queue.ack(1).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 1);
        assert_eq!(queue.front().await.unwrap().seq, 2);
        assert!(matches!(queue.ack(1).await, Err(QueueError::NotFound(1))));
    }

    #[tokio::test]
    async fn empty_queue() {
        let dir = tempdir().unwrap();
        let queue = open_queue(dir.path());
        assert!(matches!(queue.front().await, Err(QueueError::Empty)));
    }

    #[tokio::test]
    async fn update_persists_attempts() {
        let dir = tempdir().unwrap();

        {
            let queue = open_queue(dir.path());
            let mut mutation =
                queue.enqueue(post("https://x.test/api/transactions")).await.unwrap();
            mutation.record_attempt("network unreachable");
            queue.update(&mutation).await.unwrap();
        }

        let queue = open_queue(dir.path());
        let front = queue.front().await.unwrap();
        assert_eq!(front.attempts, 1);
        assert_eq!(front.last_error.as_deref(), Some("network unreachable"));
    }
}
