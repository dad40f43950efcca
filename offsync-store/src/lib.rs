//! Versioned response cache for offline-capable HTTP clients.
//!
//! Responses live in named buckets; a bucket belongs to one deployed
//! generation (its name carries the version tag) and is dropped whole when
//! a newer generation activates. The crate offers a trait-based API with
//! pluggable backends:
//! - in-memory (tests, short-lived processes)
//! - fjall (durable across restarts)

pub mod backend;
pub mod store;
pub mod types;

pub use backend::{FjallBucketStore, MemoryBucketStore};
pub use store::{AbstractBucketStore, BucketPredicate, BucketStore};
pub use types::{
    CacheEntry, CachedResponse, CapturedRequest, Method, RequestKey, VersionTag,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Refusing to store non-success response (status {status}) for {key}")]
    NotStorable { status: u16, key: String },
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
}
