//! Deterministic mapping from server responses to mutation dispositions.

use crate::transport::SyncResponse;

/// Resolution chosen for a delivery attempt that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The write was applied; remove the mutation.
    Synced,
    /// The server rejected the write as stale; terminal, needs the user.
    Conflict,
    /// Transient server trouble; reschedule with backoff.
    Retryable,
}

/// Classifies a server response.
///
/// Only transport/precondition semantics are interpreted here, never
/// business rules. Definitive 4xx rejections (including 404/409/410/412
/// precondition and gone-entity signals) are conflicts because the local
/// intent can no longer be applied safely; 408 and 429 are explicit
/// try-again signals, and 5xx is transient by assumption. Anything else a
/// server could legally emit without applying the write is retried.
pub fn classify(response: &SyncResponse) -> Disposition {
    match response.status {
        200..=299 => Disposition::Synced,
        408 | 429 => Disposition::Retryable,
        400..=499 => Disposition::Conflict,
        _ => Disposition::Retryable,
    }
}
