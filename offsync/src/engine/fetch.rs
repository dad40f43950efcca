//! Request entry point: classify, execute the matching strategy, capture
//! failed mutations for replay.

use derive_builder::Builder;
use tracing::{debug, warn};
use url::Url;

use super::strategies::queued_payload;
use super::EngineError;
use crate::transport::{AbstractTransport, TransportError};
use offsync_queue::AbstractMutationQueue;
use offsync_router::{Strategy, StrategyRouter};
use offsync_store::{
    AbstractBucketStore, CachedResponse, CapturedRequest, RequestKey, VersionTag,
};

/// Where a returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Fresh from the network.
    Network,
    /// Served from a cache bucket.
    Cache,
    /// Synthesized offline indicator; nothing cached, network unreachable.
    Offline,
    /// Mutation captured for later replay.
    Queued,
}

/// Response handed to the caller, tagged with its provenance so a UI can
/// render degraded states without sniffing bodies.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub response: CachedResponse,
    pub source: FetchSource,
    pub strategy: Strategy,
}

#[derive(Builder, Clone, Debug)]
#[builder(public, setter(into))]
pub struct EngineOptions {
    /// Key of a pre-seeded page served when a static asset is unreachable
    /// and uncached.
    #[builder(default = "None")]
    pub offline_page: Option<RequestKey>,
    /// Only mutations under this path prefix are captured for replay.
    #[builder(default = "String::from(\"/api/\")")]
    pub api_prefix: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            offline_page: None,
            api_prefix: String::from("/api/"),
        }
    }
}

/// Ties the pieces together: classifies a request, runs the matching
/// strategy against the store and transport, and captures failed mutations
/// for replay. All state is passed in at construction; nothing is ambient.
pub struct FetchEngine {
    pub(crate) router: StrategyRouter,
    pub(crate) store: AbstractBucketStore,
    pub(crate) queue: AbstractMutationQueue,
    pub(crate) transport: AbstractTransport,
    pub(crate) tag: VersionTag,
    pub(crate) options: EngineOptions,
}

impl FetchEngine {
    pub fn new(
        router: StrategyRouter,
        store: AbstractBucketStore,
        queue: AbstractMutationQueue,
        transport: AbstractTransport,
        tag: VersionTag,
        options: EngineOptions,
    ) -> Self {
        Self {
            router,
            store,
            queue,
            transport,
            tag,
            options,
        }
    }

    pub fn version(&self) -> &VersionTag {
        &self.tag
    }

    /// Handle one request end to end. For cacheable GET flows this never
    /// fails with a bare transport error; it degrades to cache or to a
    /// structured offline payload instead.
    pub async fn handle(
        &self,
        request: CapturedRequest,
    ) -> Result<Fetched, EngineError> {
        let url = Url::parse(&request.url).map_err(|e| {
            EngineError::Transport(TransportError::Malformed(e.to_string()))
        })?;
        let strategy = self.router.classify(request.method, &url);
        debug!(
            method = %request.method,
            url = %request.url,
            strategy = %strategy,
            "dispatching request"
        );

        match strategy {
            Strategy::CacheFirst => self.cache_first(&request).await,
            Strategy::NetworkFirst => self.network_first(&request).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(&request).await
            }
            Strategy::Bypass => self.bypass(&request, &url).await,
        }
    }

    /// Straight through to the network. A connectivity failure on a
    /// mutating API request captures it for replay; everything else
    /// propagates.
    async fn bypass(
        &self,
        request: &CapturedRequest,
        url: &Url,
    ) -> Result<Fetched, EngineError> {
        match self.transport.send(request).await {
            Ok(response) => Ok(Fetched {
                response,
                source: FetchSource::Network,
                strategy: Strategy::Bypass,
            }),
            Err(err) if err.is_connectivity() => {
                let in_api = url.path().starts_with(&self.options.api_prefix);
                if request.method.is_mutation() && in_api {
                    let queued = self.queue.enqueue(request.clone()).await?;
                    warn!(
                        seq = queued.seq,
                        method = %request.method,
                        url = %request.url,
                        "mutation captured for replay"
                    );
                    Ok(Fetched {
                        response: queued_payload(queued.seq),
                        source: FetchSource::Queued,
                        strategy: Strategy::Bypass,
                    })
                } else {
                    Err(EngineError::Transport(err))
                }
            }
            Err(err) => Err(EngineError::Transport(err)),
        }
    }
}
