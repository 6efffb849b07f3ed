//! In-memory queue store.

use hashbrown::HashMap;

use crate::{
    mutation::Mutation,
    types::{AttemptCount, MutationId, MutationStatus},
};

use super::{QueueStore, StoreError, StoreResult};

/// Non-durable [`QueueStore`] used in tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<MutationId, Mutation>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryStore {
    fn append(&mut self, mutation: &Mutation) -> StoreResult<()> {
        if self.records.contains_key(&mutation.id) {
            return Err(StoreError::Duplicate(mutation.id));
        }
        self.records.insert(mutation.id, mutation.clone());
        Ok(())
    }

    fn update(
        &mut self,
        id: MutationId,
        status: MutationStatus,
        attempts: AttemptCount,
    ) -> StoreResult<()> {
        if let Some(rec) = self.records.get_mut(&id) {
            rec.status = status;
            rec.attempts = attempts;
        }
        Ok(())
    }

    fn remove(&mut self, id: MutationId) -> StoreResult<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    fn get(&self, id: MutationId) -> StoreResult<Option<Mutation>> {
        Ok(self.records.get(&id).cloned())
    }

    fn list_all(&self) -> StoreResult<Vec<Mutation>> {
        let mut out: Vec<Mutation> = self.records.values().cloned().collect();
        out.sort_by_key(|m| m.id);
        Ok(out)
    }

    fn list_by_entity(&self, entity_id: &str) -> StoreResult<Vec<Mutation>> {
        let mut out: Vec<Mutation> = self
            .records
            .values()
            .filter(|m| m.entity_id == entity_id)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.id);
        Ok(out)
    }
}
