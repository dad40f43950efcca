//! External events mapped onto the engine's async entry points.
//!
//! Hosts deliver lifecycle, fetch, sync and push triggers as plain enum
//! values; nothing registers callbacks. This keeps the control flow
//! explicit and every entry point directly testable.

use std::sync::Arc;

use tracing::warn;

use super::fetch::{EngineOptions, FetchEngine, Fetched};
use super::lifecycle::Lifecycle;
use super::sync::{DrainReport, SyncOptions, SyncWorker};
use super::EngineError;
use crate::notify::{Notification, NotificationSink, PushPayload};
use crate::transport::{AbstractTransport, HttpTransport};
use offsync_config::EngineConfig;
use offsync_queue::{
    AbstractMutationQueue, FjallMutationQueue, InMemoryMutationQueue,
    JsonSerializer,
};
use offsync_router::StrategyRouter;
use offsync_store::{
    AbstractBucketStore, CapturedRequest, FjallBucketStore, MemoryBucketStore,
    Method, RequestKey, VersionTag,
};

/// External events delivered by the host environment.
#[derive(Debug)]
pub enum EngineEvent {
    /// Seed the static bucket for the current version.
    Install,
    /// Evict stale generations and take over traffic.
    Activate,
    /// Handle one outgoing request.
    Fetch(CapturedRequest),
    /// Replay queued mutations.
    Sync,
    /// Shape (and, with a sink attached, display) a push notification.
    Push(PushPayload),
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed { seeded: usize },
    Activated { evicted: Vec<String> },
    Fetched(Fetched),
    Synced(DrainReport),
    Notified(Notification),
}

/// Owns the engine components and routes events to them.
pub struct EventDispatcher {
    engine: Arc<FetchEngine>,
    lifecycle: Arc<Lifecycle>,
    sync: Arc<SyncWorker>,
    notifications: Option<Arc<dyn NotificationSink>>,
    app_name: String,
}

impl EventDispatcher {
    pub fn new(
        engine: Arc<FetchEngine>,
        lifecycle: Arc<Lifecycle>,
        sync: Arc<SyncWorker>,
    ) -> Self {
        Self {
            engine,
            lifecycle,
            sync,
            notifications: None,
            app_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    /// Attach a display sink; `app_name` becomes the default notification
    /// title.
    pub fn with_notifications(
        mut self,
        sink: Arc<dyn NotificationSink>,
        app_name: impl Into<String>,
    ) -> Self {
        self.notifications = Some(sink);
        self.app_name = app_name.into();
        self
    }

    /// Assemble the full stack from configuration: fjall-backed store and
    /// queue when a storage path is configured, in-memory otherwise, a
    /// standard router over the configured namespaces, and a reqwest
    /// transport.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let store: AbstractBucketStore = match &config.storage.path {
            Some(path) => Arc::new(FjallBucketStore::open(path.join("store"))?),
            None => Arc::new(MemoryBucketStore::new()),
        };
        let queue: AbstractMutationQueue = match &config.storage.path {
            Some(path) => Arc::new(
                FjallMutationQueue::<JsonSerializer>::open(path.join("queue"))?,
            ),
            None => Arc::new(InMemoryMutationQueue::<JsonSerializer>::new()),
        };
        let transport: AbstractTransport =
            Arc::new(HttpTransport::from_config(&config.http)?);
        let router =
            StrategyRouter::standard(&config.api_prefix, &config.static_extensions);
        let tag = VersionTag::new(config.version.clone());
        let options = EngineOptions {
            offline_page: config
                .offline_page
                .as_ref()
                .map(|url| RequestKey::new(Method::Get, url.clone())),
            api_prefix: config.api_prefix.clone(),
        };

        let engine = Arc::new(FetchEngine::new(
            router,
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::clone(&transport),
            tag.clone(),
            options,
        ));
        let lifecycle = Arc::new(Lifecycle::new(
            store,
            Arc::clone(&transport),
            tag,
            config.manifest.clone(),
        ));
        let sync = Arc::new(SyncWorker::new(
            queue,
            transport,
            SyncOptions::default(),
        ));

        Ok(Self::new(engine, lifecycle, sync))
    }

    pub fn engine(&self) -> &Arc<FetchEngine> {
        &self.engine
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn sync_worker(&self) -> &Arc<SyncWorker> {
        &self.sync
    }

    pub async fn dispatch(
        &self,
        event: EngineEvent,
    ) -> Result<EventOutcome, EngineError> {
        match event {
            EngineEvent::Install => {
                let seeded = self.lifecycle.install().await?;
                Ok(EventOutcome::Installed { seeded })
            }
            EngineEvent::Activate => {
                let evicted = self.lifecycle.activate().await?;
                Ok(EventOutcome::Activated { evicted })
            }
            EngineEvent::Fetch(request) => {
                let fetched = self.engine.handle(request).await?;
                Ok(EventOutcome::Fetched(fetched))
            }
            EngineEvent::Sync => {
                let report = self.sync.drain().await?;
                Ok(EventOutcome::Synced(report))
            }
            EngineEvent::Push(payload) => {
                let notification = payload.into_notification(&self.app_name);
                if let Some(sink) = &self.notifications {
                    if let Err(err) = sink.show(notification.clone()).await {
                        // display is best-effort UI plumbing
                        warn!(error = %err, "notification sink failed");
                    }
                }
                Ok(EventOutcome::Notified(notification))
            }
        }
    }
}
