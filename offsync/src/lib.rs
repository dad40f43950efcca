//! # offsync — offline request cache & sync engine
//!
//! `offsync` is the caching core of an offline-capable HTTP client:
//! versioned response buckets, pluggable caching strategies and a durable
//! replay queue for writes performed while disconnected. It is the engine
//! a service worker implements in the browser, extracted into a standalone,
//! testable library.
//!
//! ## Features
//!
//! - **Three read strategies plus a bypass lane**: cache-first for static
//!   assets, network-first for API reads, stale-while-revalidate for pages,
//!   chosen by an ordered, extensible rule list.
//! - **Structured offline degradation**: callers get typed offline payloads
//!   instead of raw transport errors on every cacheable GET flow.
//! - **Mutation replay**: non-idempotent API calls that fail offline are
//!   captured durably and replayed FIFO on an external trigger.
//! - **Versioned lifecycle**: a new generation installs next to the active
//!   one (all-or-nothing seeding) and evicts stale buckets at activation.
//! - **Pluggable backends**: in-memory or fjall-backed store and queue.
//! - **Abstract transport**: anything that can distinguish connectivity
//!   failures from HTTP error statuses plugs in; a reqwest transport is
//!   provided.
//!
//! ## Modules
//!
//! - `engine`: strategy executors, lifecycle manager, sync worker and the
//!   event dispatcher tying them together.
//! - `transport`: the network boundary.
//! - `notify`: push payload shaping and notification-click routing.

pub mod engine;
pub mod notify;
pub mod prelude;
pub mod transport;

pub use offsync_config as config;
pub use offsync_queue as queue;
pub use offsync_router as router;
pub use offsync_store as store;

// re-export
pub use async_trait;
pub use serde;
pub use serde_json;
pub use tracing;
pub use url;
