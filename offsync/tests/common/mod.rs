//! Shared transport mock and engine fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use offsync::async_trait::async_trait;
use offsync::prelude::*;

/// Scripted transport: URL -> response routes, a call log, an offline
/// switch and an optional gate that parks every send until notified.
pub struct MockTransport {
    routes: Mutex<HashMap<String, CachedResponse>>,
    call_log: Mutex<Vec<String>>,
    offline: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            call_log: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
            gate: Mutex::new(None),
        })
    }

    pub fn route(&self, url: &str, response: CachedResponse) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Park subsequent sends until the returned gate is notified.
    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkTransport for MockTransport {
    async fn send(
        &self,
        request: &CapturedRequest,
    ) -> Result<CachedResponse, TransportError> {
        self.call_log.lock().unwrap().push(request.url.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Connectivity(
                "simulated outage".to_string(),
            ));
        }

        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| CachedResponse::new(404)))
    }
}

pub fn ok_text(body: &str) -> CachedResponse {
    CachedResponse::new(200)
        .with_header("content-type", "text/plain")
        .with_body(body.as_bytes().to_vec())
}

pub fn ok_json(body: &str) -> CachedResponse {
    CachedResponse::new(200)
        .with_header("content-type", "application/json")
        .with_body(body.as_bytes().to_vec())
}

pub const TAG: &str = "v1";

/// Engine over in-memory store/queue, standard router, version tag `v1`.
pub fn engine_with(
    transport: Arc<MockTransport>,
) -> (FetchEngine, AbstractBucketStore, AbstractMutationQueue) {
    engine_with_options(transport, EngineOptions::default())
}

pub fn engine_with_options(
    transport: Arc<MockTransport>,
    options: EngineOptions,
) -> (FetchEngine, AbstractBucketStore, AbstractMutationQueue) {
    let store: AbstractBucketStore = Arc::new(MemoryBucketStore::new());
    let queue: AbstractMutationQueue =
        Arc::new(InMemoryMutationQueue::<JsonSerializer>::new());
    let engine = FetchEngine::new(
        StrategyRouter::default(),
        Arc::clone(&store),
        Arc::clone(&queue),
        transport as AbstractTransport,
        VersionTag::new(TAG),
        options,
    );
    (engine, store, queue)
}
