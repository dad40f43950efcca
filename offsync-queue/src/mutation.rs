use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use offsync_store::CapturedRequest;

/// Identity of a queued mutation, independent of its queue position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct MutationId(Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn get(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A mutating request captured after a connectivity failure, waiting to be
/// replayed in arrival order.
///
/// Replay is at-least-once: if the original send actually reached the
/// server but its response was lost, replaying creates a duplicate. There
/// is no idempotency key to deduplicate against, so consumers must treat
/// that as a known risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMutation {
    pub id: MutationId,
    /// Monotonically increasing; replay order is FIFO by `seq`.
    pub seq: u64,
    pub request: CapturedRequest,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl QueuedMutation {
    pub fn new(seq: u64, request: CapturedRequest) -> Self {
        Self {
            id: MutationId::new(),
            seq,
            request,
            enqueued_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }

    pub fn record_attempt(&mut self, err_msg: &str) {
        self.attempts += 1;
        self.last_error = Some(err_msg.to_string());
    }
}
