//! Mutation replay.
//!
//! The worker replays captured mutations FIFO against the transport when
//! an external trigger says so; it never polls on its own. A replay that
//! reaches the server settles the mutation either way: 2xx acknowledges
//! it, 4xx/5xx removes it as a rejected application error (retrying cannot
//! help). Only connectivity failures leave a mutation queued.

use derive_builder::Builder;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::EngineError;
use crate::transport::AbstractTransport;
use offsync_queue::{AbstractMutationQueue, QueuedMutation};
use offsync_store::CachedResponse;

/// Outcome of one replay sweep.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Replayed and acknowledged (2xx).
    pub succeeded: Vec<QueuedMutation>,
    /// Reached the server and was rejected (4xx/5xx); removed from the
    /// queue, surfaced here as an application error.
    pub rejected: Vec<(QueuedMutation, CachedResponse)>,
    /// Connectivity failed again; left queued for the next trigger.
    pub still_pending: Vec<QueuedMutation>,
}

impl DrainReport {
    /// True when the sweep left nothing behind.
    pub fn is_clean(&self) -> bool {
        self.still_pending.is_empty()
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(public, setter(into))]
pub struct SyncOptions {
    /// Stop the sweep at the first connectivity failure so a later
    /// mutation never overtakes an earlier one for the same resource.
    #[builder(default = "true")]
    pub stop_on_failure: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            stop_on_failure: true,
        }
    }
}

/// External trigger for a replay sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    ConnectivityRestored,
    SyncRequested,
}

#[derive(Debug, Error)]
pub enum SyncTriggerError {
    #[error("sync channel closed")]
    ChannelClosed,
}

/// Cloneable handle that lets the application request a sweep without
/// holding the worker itself.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncSignal>,
}

impl SyncHandle {
    pub async fn trigger(
        &self,
        signal: SyncSignal,
    ) -> Result<(), SyncTriggerError> {
        self.tx
            .send(signal)
            .await
            .map_err(|_| SyncTriggerError::ChannelClosed)
    }
}

/// Replays captured mutations, oldest first. Sweeps are serialized: a
/// trigger arriving while a sweep runs waits its turn, so no mutation is
/// ever replayed concurrently with itself.
pub struct SyncWorker {
    queue: AbstractMutationQueue,
    transport: AbstractTransport,
    options: SyncOptions,
    drain_lock: tokio::sync::Mutex<()>,
}

impl SyncWorker {
    pub fn new(
        queue: AbstractMutationQueue,
        transport: AbstractTransport,
        options: SyncOptions,
    ) -> Self {
        Self {
            queue,
            transport,
            options,
            drain_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// One replay sweep over the queue snapshot, FIFO by sequence number.
    pub async fn drain(&self) -> Result<DrainReport, EngineError> {
        let _guard = self.drain_lock.lock().await;
        let pending = self.queue.pending().await?;
        let mut report = DrainReport::default();

        let mut iter = pending.into_iter();
        while let Some(mut mutation) = iter.next() {
            match self.transport.send(&mutation.request).await {
                Ok(response) if response.is_success() => {
                    self.queue.ack(mutation.seq).await?;
                    info!(seq = mutation.seq, url = %mutation.request.url, "mutation replayed");
                    report.succeeded.push(mutation);
                }
                Ok(response) => {
                    // The server saw it and said no; this is an
                    // application error, not a retry candidate.
                    self.queue.ack(mutation.seq).await?;
                    warn!(
                        seq = mutation.seq,
                        status = response.status,
                        url = %mutation.request.url,
                        "mutation rejected on replay"
                    );
                    report.rejected.push((mutation, response));
                }
                Err(err) if err.is_connectivity() => {
                    mutation.record_attempt(&err.to_string());
                    self.queue.update(&mutation).await?;
                    debug!(
                        seq = mutation.seq,
                        attempts = mutation.attempts,
                        "replay failed, mutation left queued"
                    );
                    report.still_pending.push(mutation);
                    if self.options.stop_on_failure {
                        report.still_pending.extend(iter);
                        break;
                    }
                }
                Err(err) => {
                    // Malformed capture: keep it queued for inspection but
                    // do not let it wedge the sweep.
                    mutation.record_attempt(&err.to_string());
                    self.queue.update(&mutation).await?;
                    warn!(seq = mutation.seq, error = %err, "replay not sendable");
                    report.still_pending.push(mutation);
                }
            }
        }

        Ok(report)
    }

    /// Spawn the worker loop; each received signal runs one sweep. The
    /// loop ends when every handle is dropped.
    pub fn spawn(self) -> (SyncHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<SyncSignal>(16);
        let handle = tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                debug!(?signal, "sync triggered");
                match self.drain().await {
                    Ok(report) => {
                        info!(
                            succeeded = report.succeeded.len(),
                            rejected = report.rejected.len(),
                            pending = report.still_pending.len(),
                            "sweep finished"
                        );
                    }
                    Err(err) => {
                        error!(error = %err, "sweep failed");
                    }
                }
            }
        });
        (SyncHandle { tx }, handle)
    }
}
