//! Workflow error taxonomy.
//!
//! Every lower-layer error converts into [`WorkflowError`] via `From`, so
//! workflow bodies propagate with `?`.

use certi_blob::BlobError;
use certi_core::{AccessDenied, ContentRef, Identity, IdentityError, ValidationError};
use certi_ledger::{LedgerError, TxHandle};

/// Errors surfaced by [`CredentialWorkflows`](crate::CredentialWorkflows).
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The caller's role does not permit the action.
    #[error("forbidden: {0}")]
    Forbidden(#[from] AccessDenied),

    /// An identity input is not a valid participant.
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    /// A label or payload failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The addressed document does not exist.
    #[error("document index {index} out of range for {subject} (count {count})")]
    IndexOutOfRange {
        /// Owner of the document sequence.
        subject: Identity,
        /// Requested index.
        index: u64,
        /// Number of documents the subject has.
        count: u64,
    },

    /// The registry or the signing session could not be used.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// The blob store did not accept the payload.
    #[error("blob upload failed: {0}")]
    BlobUploadFailed(#[from] BlobError),

    /// The ledger declined the transition.
    #[error("transaction rejected: {reason}")]
    TransactionRejected {
        /// Ledger-supplied reason, verbatim.
        reason: String,
    },

    /// Bytes were stored but the registry entry pointing at them was not
    /// observed as finalized. Retry the whole upload.
    #[error("blob {content_ref} stored but not registered: {cause}")]
    OrphanedBlob {
        /// Reference of the stored, unregistered blob.
        content_ref: ContentRef,
        /// Why the registration did not finalize.
        #[source]
        cause: Box<WorkflowError>,
    },

    /// The caller stopped waiting for the transition. Only appears as the
    /// cause of [`WorkflowError::OrphanedBlob`].
    #[error("transaction {handle} was not finalized in time")]
    Unfinalized {
        /// Submitted transition that may still finalize.
        handle: TxHandle,
    },
}

impl WorkflowError {
    pub(crate) fn orphaned(content_ref: ContentRef, cause: WorkflowError) -> Self {
        Self::OrphanedBlob {
            content_ref,
            cause: Box::new(cause),
        }
    }
}

impl From<LedgerError> for WorkflowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected { reason } => Self::TransactionRejected { reason },
            LedgerError::IndexOutOfRange {
                subject,
                index,
                count,
            } => Self::IndexOutOfRange {
                subject,
                index,
                count,
            },
            other @ (LedgerError::Unavailable(_)
            | LedgerError::NoSession { .. }
            | LedgerError::Malformed { .. }
            | LedgerError::UnknownTransaction(_)) => Self::RegistryUnavailable(other.to_string()),
        }
    }
}

impl From<ValidationError> for WorkflowError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
