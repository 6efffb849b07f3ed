//! Shared primitive IDs and queue enums.

use serde::{Deserialize, Serialize};

/// Monotonic local mutation identifier; doubles as the ordering key.
pub type MutationId = u64;
/// Identifier of the business entity a mutation targets.
pub type EntityId = String;
/// Count of delivery attempts made for a mutation.
pub type AttemptCount = u32;

/// Lifecycle status of a queued mutation.
///
/// `Synced` is a deletion, not a retained state: the engine removes the row
/// on successful delivery, so stores never hold synced mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    /// Awaiting delivery; the only resyncable state.
    Pending,
    /// Rejected by the server due to stale state; needs caller action.
    Conflict,
    /// Retry ceiling reached; needs caller action.
    Failed,
    /// Delivered and acknowledged.
    Synced,
}

impl MutationStatus {
    /// True for terminal-but-visible states that only explicit caller
    /// action (retry, discard) can change.
    pub fn is_terminal(self) -> bool {
        matches!(self, MutationStatus::Conflict | MutationStatus::Failed)
    }

    /// True for any state shown in the UI-facing active set.
    pub fn is_active(self) -> bool {
        self != MutationStatus::Synced
    }
}

/// HTTP method of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Wire representation of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}
