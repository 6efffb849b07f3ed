//! Queue persistence abstraction and backends.

/// Hashbrown-backed store for tests and ephemeral sessions.
pub mod memory;
/// Durable SQLite-backed store.
pub mod sqlite;

use crate::{
    mutation::Mutation,
    types::{AttemptCount, MutationId, MutationStatus},
};

/// Persistence failure surfaced by a [`QueueStore`] backend.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    Sqlite(rusqlite::Error),
    /// Payload encode/decode failure.
    Serde(serde_json::Error),
    /// Append with an id that already exists.
    Duplicate(MutationId),
    /// Backend-specific failure description.
    Message(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Crash-consistent storage for the mutation set.
///
/// Losing a write silently is the worst failure mode of this subsystem, so
/// every method reports storage trouble as an explicit [`StoreError`]. Reads
/// return the latest persisted state ordered by id ascending.
pub trait QueueStore: Send {
    /// Atomically stores a new mutation; a duplicate id is an error.
    fn append(&mut self, mutation: &Mutation) -> StoreResult<()>;
    /// Updates status and attempt count; no-op when the id is gone.
    fn update(
        &mut self,
        id: MutationId,
        status: MutationStatus,
        attempts: AttemptCount,
    ) -> StoreResult<()>;
    /// Deletes a mutation permanently; returns whether it existed.
    fn remove(&mut self, id: MutationId) -> StoreResult<bool>;
    /// Fetches a single mutation.
    fn get(&self, id: MutationId) -> StoreResult<Option<Mutation>>;
    /// Lists every stored mutation in id order.
    fn list_all(&self) -> StoreResult<Vec<Mutation>>;
    /// Lists mutations targeting one entity, in id order.
    fn list_by_entity(&self, entity_id: &str) -> StoreResult<Vec<Mutation>>;
}
