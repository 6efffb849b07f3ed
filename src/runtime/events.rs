//! Queue event stream payloads.

/// Events emitted from the single-writer queue loop.
///
/// Variants carry no payload on purpose: subscribers re-query current state
/// through the handle instead of trusting event data, so a slow consumer can
/// never act on a stale snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    /// A mutation was accepted into the queue.
    MutationQueued,
    /// A sync cycle resolved a mutation: synced, conflict, or failed.
    MutationSynced,
}
