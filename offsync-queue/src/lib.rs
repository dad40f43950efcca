//! Durable FIFO queue of mutations captured while offline.
//!
//! A mutating request that fails with a connectivity error is captured here
//! and replayed later, in arrival order, when an external trigger says the
//! network is back. Backends:
//! - in-memory (tests, ephemeral sessions)
//! - fjall (queued writes survive restarts)

pub mod backend;
pub mod mutation;
pub mod queue;
pub mod serializers;

pub use backend::{FjallMutationQueue, InMemoryMutationQueue};
pub use mutation::{MutationId, QueuedMutation};
pub use queue::{AbstractMutationQueue, MutationQueue};
pub use serializers::{JsonSerializer, MutationSerializer};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue is empty")]
    Empty,
    #[error("Mutation not found: seq {0}")]
    NotFound(u64),
    #[error("Queue error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
}
