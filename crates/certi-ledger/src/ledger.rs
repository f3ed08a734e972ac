//! # Ledger Trait Seam
//!
//! The registry's authoritative surface, as the rest of the system sees it.
//!
//! | Operation      | Kind  | Method                          |
//! |----------------|-------|---------------------------------|
//! | ownerOf        | read  | [`RegistryLedger::owner_of`]    |
//! | isIssuer       | read  | [`RegistryLedger::is_issuer`]   |
//! | documentCount  | read  | [`RegistryLedger::document_count`] |
//! | documentAt     | read  | [`RegistryLedger::document_at`] |
//! | registerIssuer | write | `submit(RegistryCall::RegisterIssuer)` |
//! | appendDocument | write | `submit(RegistryCall::AppendDocument)` |
//! | attestDocument | write | `submit(RegistryCall::AttestDocument)` |
//!
//! Implementations enforce access control themselves. A client that skips
//! its own pre-flight checks must still be refused by the ledger.

use async_trait::async_trait;
use certi_core::{ContentRef, Document, DocumentLabel, Identity};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::tx::{TxHandle, TxStatus};

/// A state-changing registry transition.
///
/// `AppendDocument` carries no subject and no index: the ledger keys the
/// document by the submitter and assigns the index itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RegistryCall {
    /// Add an identity to the issuer set (owner only).
    RegisterIssuer {
        /// Identity to add.
        identity: Identity,
    },
    /// Append a document to the submitter's sequence.
    AppendDocument {
        /// Blob store reference of the document bytes.
        content_ref: ContentRef,
        /// Document name.
        label: DocumentLabel,
    },
    /// Mark a subject's document as verified (owner or issuer).
    AttestDocument {
        /// Owner of the document.
        subject: Identity,
        /// Index in the subject's sequence.
        index: u64,
    },
}

impl RegistryCall {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterIssuer { .. } => "registerIssuer",
            Self::AppendDocument { .. } => "appendDocument",
            Self::AttestDocument { .. } => "attestDocument",
        }
    }
}

/// Authoritative document registry.
#[async_trait]
pub trait RegistryLedger: Send + Sync {
    /// Identity fixed as owner at genesis.
    async fn owner_of(&self) -> Result<Identity, LedgerError>;

    /// Whether `identity` is in the issuer set.
    async fn is_issuer(&self, identity: &Identity) -> Result<bool, LedgerError>;

    /// Number of documents appended for `subject`.
    async fn document_count(&self, subject: &Identity) -> Result<u64, LedgerError>;

    /// Document at `index` for `subject`.
    ///
    /// Fails with [`LedgerError::IndexOutOfRange`] when `index` is not
    /// below the current count.
    async fn document_at(&self, subject: &Identity, index: u64) -> Result<Document, LedgerError>;

    /// Submit a transition signed as `submitter`.
    async fn submit(
        &self,
        submitter: &Identity,
        call: RegistryCall,
    ) -> Result<TxHandle, LedgerError>;

    /// Current status of a submitted transition.
    async fn status(&self, handle: &TxHandle) -> Result<TxStatus, LedgerError>;
}
