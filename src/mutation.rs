//! Mutation record, opaque operation payload, and persistence envelope.

use serde::{Deserialize, Serialize};

use crate::types::{AttemptCount, EntityId, HttpMethod, MutationId, MutationStatus};

/// Version number for serialized [`OperationEnvelope`] payloads.
pub const OPERATION_FORMAT_VERSION: u16 = 1;

/// Self-describing write request against a server endpoint.
///
/// The queue never interprets this; it is handed verbatim to the transport.
/// Callers must make it complete enough to replay without business context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Request method.
    pub method: HttpMethod,
    /// Target endpoint path.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
}

impl Operation {
    /// Builds an operation payload.
    pub fn new(method: HttpMethod, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// A queued, not-yet-confirmed write against a server entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Local monotonic id; delivery for one entity follows id order.
    pub id: MutationId,
    /// Business entity this mutation targets.
    pub entity_id: EntityId,
    /// Opaque request to replay against the server.
    pub operation: Operation,
    /// Current lifecycle status.
    pub status: MutationStatus,
    /// Delivery attempts made so far.
    pub attempts: AttemptCount,
    /// Creation timestamp in milliseconds since epoch.
    pub created_at_ms: u64,
}

/// Versioned wrapper for stable on-disk operation decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped operation.
    pub operation: Operation,
}

impl OperationEnvelope {
    /// Constructs an envelope using [`OPERATION_FORMAT_VERSION`].
    pub fn new(operation: Operation) -> Self {
        Self {
            format_version: OPERATION_FORMAT_VERSION,
            operation,
        }
    }
}
