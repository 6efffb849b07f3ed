//! SQLite-backed durable queue store.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    mutation::{Mutation, OPERATION_FORMAT_VERSION, Operation, OperationEnvelope},
    types::{AttemptCount, MutationId, MutationStatus},
};

use super::{QueueStore, StoreError, StoreResult};

/// SQLite implementation of [`QueueStore`].
///
/// Each mutation is one row; appends are single-statement inserts, which
/// keeps them atomic under crashes. Operation payloads are stored as
/// versioned JSON envelopes.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }
}

impl QueueStore for SqliteStore {
    fn append(&mut self, mutation: &Mutation) -> StoreResult<()> {
        let payload = serde_json::to_vec(&OperationEnvelope::new(mutation.operation.clone()))?;
        let inserted = self.conn.execute(
            "INSERT INTO mutations(id, entity_id, status, attempts, created_at_ms, operation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                mutation.id as i64,
                mutation.entity_id,
                status_code(mutation.status),
                mutation.attempts as i64,
                mutation.created_at_ms as i64,
                payload,
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate(mutation.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update(
        &mut self,
        id: MutationId,
        status: MutationStatus,
        attempts: AttemptCount,
    ) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE mutations SET status = ?2, attempts = ?3 WHERE id = ?1",
            params![id as i64, status_code(status), attempts as i64],
        )?;
        Ok(())
    }

    fn remove(&mut self, id: MutationId) -> StoreResult<bool> {
        let count = self
            .conn
            .execute("DELETE FROM mutations WHERE id = ?1", params![id as i64])?;
        Ok(count > 0)
    }

    fn get(&self, id: MutationId) -> StoreResult<Option<Mutation>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, entity_id, status, attempts, created_at_ms, operation
                 FROM mutations WHERE id = ?1",
                params![id as i64],
                row_to_mutation,
            )
            .optional()?;
        Ok(row)
    }

    fn list_all(&self) -> StoreResult<Vec<Mutation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_id, status, attempts, created_at_ms, operation
             FROM mutations ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], row_to_mutation)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn list_by_entity(&self, entity_id: &str) -> StoreResult<Vec<Mutation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_id, status, attempts, created_at_ms, operation
             FROM mutations WHERE entity_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![entity_id], row_to_mutation)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn status_code(status: MutationStatus) -> i64 {
    match status {
        MutationStatus::Synced => 0,
        MutationStatus::Pending => 1,
        MutationStatus::Conflict => 2,
        MutationStatus::Failed => 3,
    }
}

fn decode_status(code: i64) -> Result<MutationStatus, String> {
    match code {
        0 => Ok(MutationStatus::Synced),
        1 => Ok(MutationStatus::Pending),
        2 => Ok(MutationStatus::Conflict),
        3 => Ok(MutationStatus::Failed),
        other => Err(format!("unknown status code: {other}")),
    }
}

fn row_to_mutation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mutation> {
    let id: i64 = row.get(0)?;
    let entity_id: String = row.get(1)?;
    let status_raw: i64 = row.get(2)?;
    let attempts: i64 = row.get(3)?;
    let created_at_ms: i64 = row.get(4)?;
    let payload: Vec<u8> = row.get(5)?;

    let status = decode_status(status_raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::other(err)),
        )
    })?;
    let operation = decode_operation_payload(&payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Blob,
            Box::new(std::io::Error::other(err)),
        )
    })?;

    Ok(Mutation {
        id: id as MutationId,
        entity_id,
        operation,
        status,
        attempts: attempts as AttemptCount,
        created_at_ms: created_at_ms as u64,
    })
}

fn decode_operation_payload(payload: &[u8]) -> Result<Operation, String> {
    let envelope = serde_json::from_slice::<OperationEnvelope>(payload)
        .map_err(|e| format!("operation payload decode failed: {e}"))?;
    if envelope.format_version != OPERATION_FORMAT_VERSION {
        return Err(format!(
            "unsupported operation format version: {}",
            envelope.format_version
        ));
    }
    Ok(envelope.operation)
}
