//! Convenience re-exports for embedding the engine.

pub use crate::engine::{
    DrainReport, EngineError, EngineEvent, EngineOptions, EngineOptionsBuilder,
    EventDispatcher, EventOutcome, FetchEngine, FetchSource, Fetched, Lifecycle,
    LifecycleState, SyncHandle, SyncOptions, SyncOptionsBuilder, SyncSignal,
    SyncWorker,
};
pub use crate::notify::{
    ClickOutcome, Notification, NotificationSink, PushPayload, route_click,
};
pub use crate::transport::{
    AbstractTransport, HttpTransport, NetworkTransport, TransportError,
};
pub use offsync_config::{ConfigError, EngineConfig};
pub use offsync_queue::{
    AbstractMutationQueue, FjallMutationQueue, InMemoryMutationQueue,
    JsonSerializer, MutationQueue, QueueError, QueuedMutation,
};
pub use offsync_router::{Rule, Strategy, StrategyRouter};
pub use offsync_store::{
    AbstractBucketStore, BucketStore, CacheEntry, CachedResponse,
    CapturedRequest, FjallBucketStore, MemoryBucketStore, Method, RequestKey,
    StoreError, VersionTag,
};
