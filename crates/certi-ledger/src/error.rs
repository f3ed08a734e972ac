//! Ledger client error types.

use certi_core::Identity;

use crate::tx::TxHandle;

/// Errors surfaced by ledger adapters and the registry client.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The ledger could not be reached or answered unusably.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// No signing session exists for the submitting identity.
    #[error("no signing session for {submitter}")]
    NoSession {
        /// Identity that attempted to submit.
        submitter: Identity,
    },

    /// The ledger declined the transition.
    #[error("transaction rejected: {reason}")]
    Rejected {
        /// Human-readable reason reported by the ledger.
        reason: String,
    },

    /// A read addressed a document past the subject's current count.
    #[error("document index {index} out of range for {subject} (count {count})")]
    IndexOutOfRange {
        /// Subject whose sequence was read.
        subject: Identity,
        /// Requested index.
        index: u64,
        /// Count observed when the read failed.
        count: u64,
    },

    /// The ledger returned data that does not decode.
    #[error("malformed response from {operation}: {detail}")]
    Malformed {
        /// Operation whose response failed to decode.
        operation: String,
        /// Decoder diagnostic.
        detail: String,
    },

    /// The ledger has no record of the transaction handle.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TxHandle),
}

impl LedgerError {
    /// Whether the error means the ledger or signing session is unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::NoSession { .. } | Self::Malformed { .. }
        )
    }
}
