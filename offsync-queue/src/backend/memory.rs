//! In-memory implementation of the mutation queue. A `BTreeMap` keyed by
//! sequence number keeps iteration order equal to replay order.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::mutation::QueuedMutation;
use crate::{MutationQueue, MutationSerializer, QueueError};
use offsync_store::CapturedRequest;

pub struct InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    entries: Mutex<BTreeMap<u64, Vec<u8>>>,
    next_seq: AtomicU64,
    _marker: PhantomData<S>,
}

impl<S> InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            next_seq: AtomicU64::new(1),
            _marker: PhantomData,
        }
    }
}

impl<S> Default for InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> MutationQueue for InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    async fn enqueue(
        &self,
        request: CapturedRequest,
    ) -> Result<QueuedMutation, QueueError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let mutation = QueuedMutation::new(seq, request);
        let bytes = S::serialize_mutation(&mutation)?;

        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        entries.insert(seq, bytes);
        tracing::debug!(seq, url = %mutation.request.url, "mutation enqueued");
        Ok(mutation)
    }

    async fn front(&self) -> Result<QueuedMutation, QueueError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        match entries.values().next() {
            Some(bytes) => S::deserialize_mutation(bytes),
            None => Err(QueueError::Empty),
        }
    }

    async fn ack(&self, seq: u64) -> Result<(), QueueError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        entries.remove(&seq).ok_or(QueueError::NotFound(seq))?;
        Ok(())
    }

    async fn update(&self, mutation: &QueuedMutation) -> Result<(), QueueError> {
        let bytes = S::serialize_mutation(mutation)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        if !entries.contains_key(&mutation.seq) {
            return Err(QueueError::NotFound(mutation.seq));
        }
        entries.insert(mutation.seq, bytes);
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<QueuedMutation>, QueueError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        entries
            .values()
            .map(|bytes| S::deserialize_mutation(bytes))
            .collect()
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(entries.len())
    }
}

impl<S> std::fmt::Debug for InMemoryMutationQueue<S>
where
    S: MutationSerializer,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock().unwrap();
        f.debug_struct("InMemoryMutationQueue")
            .field("len", &entries.len())
            .finish()
    }
}
