//! Offline-first mutation queue and sync engine for field crews.
//!
//! Writes made without connectivity are captured as durable [`mutation::Mutation`]
//! records, then drained to the backend by a single-writer async runtime once
//! connectivity returns. Per-entity ordering is strict: a later mutation for an
//! entity never reaches the server before an earlier one has resolved.
//!
//! # Example: inspecting a store directly
//!
//! ```
//! use fieldsync::{
//!     mutation::{Mutation, Operation},
//!     store::{memory::MemoryStore, QueueStore},
//!     types::{HttpMethod, MutationStatus},
//! };
//!
//! let mut store = MemoryStore::new();
//! store.append(&Mutation {
//!     id: 1,
//!     entity_id: "stop-7".into(),
//!     operation: Operation::new(HttpMethod::Post, "/api/stops/7/complete", None),
//!     status: MutationStatus::Pending,
//!     attempts: 0,
//!     created_at_ms: 0,
//! })?;
//!
//! let queued = store.list_by_entity("stop-7")?;
//! assert_eq!(queued.len(), 1);
//! assert_eq!(queued[0].status, MutationStatus::Pending);
//! # Ok::<(), fieldsync::store::StoreError>(())
//! ```
//!
//! # Example: running the queue
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fieldsync::{
//!     mutation::Operation,
//!     runtime::handle::{spawn_queue, QueueConfig, QueueError},
//!     store::sqlite::SqliteStore,
//!     transport::{SyncResponse, Transport, TransportError},
//!     types::HttpMethod,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), QueueError> {
//! let store = SqliteStore::open("queue.db").map_err(QueueError::Store)?;
//! let transport: Arc<dyn Transport> =
//!     Arc::new(|_op: &Operation| Ok::<_, TransportError>(SyncResponse::new(200)));
//!
//! let queue = spawn_queue(Box::new(store), transport, QueueConfig::default())
//!     .map_err(QueueError::Store)?;
//!
//! queue
//!     .enqueue(
//!         "stop-7",
//!         Operation::new(HttpMethod::Post, "/api/stops/7/complete", None),
//!     )
//!     .await?;
//!
//! queue.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Retry delay schedule and attempt ceiling.
pub mod backoff;
/// Sync response classification.
pub mod classify;
/// Offline-page fallback decision for navigations.
pub mod fallback;
/// Mutation records and operation payloads.
pub mod mutation;
/// Lifecycle debug trail.
pub mod observe;
/// Async runtime and event stream.
pub mod runtime;
/// Durable queue storage.
pub mod store;
/// Delivery transport abstraction.
pub mod transport;
/// Core identifier and status types.
pub mod types;
