//! The engine proper: request handling, cache generation lifecycle and
//! mutation replay, composed by an event dispatcher.

pub mod dispatcher;
pub mod fetch;
pub mod lifecycle;
pub mod strategies;
pub mod sync;

pub use dispatcher::{EngineEvent, EventDispatcher, EventOutcome};
pub use fetch::{
    EngineOptions, EngineOptionsBuilder, EngineOptionsBuilderError, FetchEngine,
    FetchSource, Fetched,
};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use sync::{
    DrainReport, SyncHandle, SyncOptions, SyncOptionsBuilder, SyncSignal,
    SyncTriggerError, SyncWorker,
};

use thiserror::Error;

use crate::transport::TransportError;
use offsync_queue::QueueError;
use offsync_store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Install failed for {url}: {reason}")]
    InstallFailed { url: String, reason: String },
    #[error("Invalid lifecycle transition: expected {expected}, state is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: LifecycleState,
    },
}
