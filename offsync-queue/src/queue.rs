//! Trait for mutation queue storage. The queue hands out its oldest entry
//! without removing it; removal happens only after the caller has settled
//! the replay, so a failed replay leaves the mutation in place.

use std::sync::Arc;

use async_trait::async_trait;

use crate::mutation::QueuedMutation;
use crate::QueueError;
use offsync_store::CapturedRequest;

#[async_trait]
pub trait MutationQueue: Send + Sync {
    /// Capture a failed request; assigns the next sequence number.
    async fn enqueue(
        &self,
        request: CapturedRequest,
    ) -> Result<QueuedMutation, QueueError>;

    /// Oldest queued mutation, left in place. `Err(Empty)` when drained.
    async fn front(&self) -> Result<QueuedMutation, QueueError>;

    /// Remove a mutation once its replay is settled.
    async fn ack(&self, seq: u64) -> Result<(), QueueError>;

    /// Rewrite a mutation in place (attempt bookkeeping).
    async fn update(&self, mutation: &QueuedMutation) -> Result<(), QueueError>;

    /// FIFO snapshot of everything still queued.
    async fn pending(&self) -> Result<Vec<QueuedMutation>, QueueError>;

    async fn len(&self) -> Result<usize, QueueError>;
}

pub type AbstractMutationQueue = Arc<dyn MutationQueue>;
