//! Delivery seam between the sync engine and the server.

use crate::mutation::Operation;

/// Response observed for one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncResponse {
    /// HTTP status code returned by the server.
    pub status: u16,
}

impl SyncResponse {
    /// Wraps a status code.
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

/// Failure to obtain any response for an attempt.
///
/// All variants are equivalent to the engine: the mutation stays pending
/// and is rescheduled with backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The bounded per-attempt wait elapsed.
    Timeout,
    /// No route to the server.
    Unreachable,
    /// Any other transport-level failure.
    Message(String),
}

/// Result alias for delivery attempts.
pub type TransportResult = Result<SyncResponse, TransportError>;

/// Delivers one self-describing operation to the server.
///
/// Implementations must bound their own per-attempt wait and report an
/// exceeded bound as [`TransportError::Timeout`]; the engine treats it like
/// any other transport failure. Calls run on a blocking worker thread, so
/// blocking HTTP clients are fine here.
pub trait Transport: Send + Sync {
    /// Attempts delivery, returning the server response or a transport
    /// failure when no response was obtained.
    fn deliver(&self, operation: &Operation) -> TransportResult;
}

impl<F> Transport for F
where
    F: Fn(&Operation) -> TransportResult + Send + Sync,
{
    fn deliver(&self, operation: &Operation) -> TransportResult {
        self(operation)
    }
}
