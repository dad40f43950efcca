//! Install/activate state machine for one cache generation.
//!
//! A new generation seeds its static bucket next to the currently active
//! one and only takes over at activation, so clients never see a
//! half-seeded asset set. Exactly one generation's buckets survive an
//! activation.

use std::sync::Mutex;

use tracing::{info, warn};

use super::EngineError;
use crate::transport::AbstractTransport;
use offsync_store::{AbstractBucketStore, CapturedRequest, VersionTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Seeding the static bucket.
    Installing,
    /// Seeded, not yet controlling traffic.
    Waiting,
    /// Controlling traffic.
    Active,
    /// Replaced by a newer generation.
    Superseded,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Active => "active",
            LifecycleState::Superseded => "superseded",
        };
        f.write_str(name)
    }
}

pub struct Lifecycle {
    store: AbstractBucketStore,
    transport: AbstractTransport,
    tag: VersionTag,
    manifest: Vec<String>,
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    pub fn new(
        store: AbstractBucketStore,
        transport: AbstractTransport,
        tag: VersionTag,
        manifest: Vec<String>,
    ) -> Self {
        Self {
            store,
            transport,
            tag,
            manifest,
            state: Mutex::new(LifecycleState::Installing),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn tag(&self) -> &VersionTag {
        &self.tag
    }

    fn set_state(&self, next: LifecycleState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = next;
    }

    fn ensure_state(
        &self,
        expected: LifecycleState,
        label: &'static str,
    ) -> Result<(), EngineError> {
        let actual = self.state();
        if actual == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                expected: label,
                actual,
            })
        }
    }

    /// Seed the static bucket with every manifest asset. All-or-nothing:
    /// a single failed fetch (connectivity or non-2xx) leaves the bucket
    /// untouched and the state at `Installing`, so the previous generation
    /// stays in service. Returns the number of seeded assets.
    pub async fn install(&self) -> Result<usize, EngineError> {
        self.ensure_state(LifecycleState::Installing, "installing")?;

        // Fetch everything before writing anything.
        let mut seeded = Vec::with_capacity(self.manifest.len());
        for url in &self.manifest {
            let request = CapturedRequest::get(url.clone());
            let response =
                self.transport.send(&request).await.map_err(|e| {
                    warn!(version = %self.tag, url = %url, error = %e, "install fetch failed");
                    EngineError::InstallFailed {
                        url: url.clone(),
                        reason: e.to_string(),
                    }
                })?;
            if !response.is_success() {
                warn!(version = %self.tag, url = %url, status = response.status, "install fetch rejected");
                return Err(EngineError::InstallFailed {
                    url: url.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            seeded.push((request.key(), response));
        }

        let bucket = self.tag.static_bucket();
        let count = seeded.len();
        for (key, response) in seeded {
            self.store.put(&bucket, &key, response).await?;
        }

        self.set_state(LifecycleState::Waiting);
        info!(version = %self.tag, assets = count, "install complete");
        Ok(count)
    }

    /// Evict every bucket from older generations and take over traffic.
    /// Returns the evicted bucket names.
    pub async fn activate(&self) -> Result<Vec<String>, EngineError> {
        self.ensure_state(LifecycleState::Waiting, "waiting")?;

        let evicted = self
            .store
            .evict_buckets(&|name| self.tag.owns(name))
            .await?;
        for name in &evicted {
            info!(version = %self.tag, bucket = %name, "evicted stale bucket");
        }

        self.set_state(LifecycleState::Active);
        info!(version = %self.tag, "activated");
        Ok(evicted)
    }

    /// Mark this generation as replaced by a newer one.
    pub fn supersede(&self) {
        self.set_state(LifecycleState::Superseded);
        info!(version = %self.tag, "superseded");
    }
}
