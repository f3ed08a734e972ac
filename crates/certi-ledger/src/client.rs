//! # Registry Client
//!
//! Thin typed wrapper over an injected [`RegistryLedger`]. It makes no
//! authorization decisions and passes ledger rejection reasons through
//! verbatim. Two behaviours live here rather than in the adapters:
//!
//! - **Enumeration with re-read.** Reads are only individually consistent.
//!   If a `document_at` inside a previously observed count reports
//!   `IndexOutOfRange`, the count is re-read and the enumeration restarted
//!   (bounded by [`MAX_SNAPSHOT_RETRIES`]).
//! - **Finality polling.** [`RegistryClient::await_finality`] polls
//!   `status` until the transition is finalized, reverted, or the caller's
//!   patience runs out.

use std::sync::Arc;

use certi_core::{ContentRef, Document, DocumentLabel, Identity};
use chrono::Utc;
use tokio::time::{sleep, Instant};

use crate::error::LedgerError;
use crate::ledger::{RegistryCall, RegistryLedger};
use crate::tx::{AwaitPolicy, Finality, TxHandle, TxReceipt, TxStatus};

/// How many times enumeration restarts after observing snapshot skew.
pub const MAX_SNAPSHOT_RETRIES: usize = 2;

/// Typed client for the document registry.
#[derive(Clone)]
pub struct RegistryClient {
    ledger: Arc<dyn RegistryLedger>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient").finish_non_exhaustive()
    }
}

impl RegistryClient {
    /// Wrap a ledger.
    pub fn new(ledger: Arc<dyn RegistryLedger>) -> Self {
        Self { ledger }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Arc<dyn RegistryLedger> {
        &self.ledger
    }

    /// Number of documents `subject` has in the latest state.
    pub async fn document_count(&self, subject: &Identity) -> Result<u64, LedgerError> {
        self.ledger.document_count(subject).await
    }

    /// The document at `index`; [`LedgerError::IndexOutOfRange`] past the end.
    pub async fn document_at(
        &self,
        subject: &Identity,
        index: u64,
    ) -> Result<Document, LedgerError> {
        self.ledger.document_at(subject, index).await
    }

    /// Every document of `subject`, in index order.
    pub async fn documents(&self, subject: &Identity) -> Result<Vec<Document>, LedgerError> {
        let mut attempt = 0;
        'enumerate: loop {
            let count = self.ledger.document_count(subject).await?;
            let mut documents = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
            for index in 0..count {
                match self.ledger.document_at(subject, index).await {
                    Ok(doc) => documents.push(doc),
                    Err(LedgerError::IndexOutOfRange { .. }) if attempt < MAX_SNAPSHOT_RETRIES => {
                        attempt += 1;
                        tracing::debug!(%subject, index, count, attempt, "document count moved during enumeration, re-reading");
                        continue 'enumerate;
                    }
                    Err(e) => return Err(e),
                }
            }
            return Ok(documents);
        }
    }

    /// Submit a new document for `subject`. The ledger assigns the index.
    pub async fn append_document(
        &self,
        subject: &Identity,
        content_ref: ContentRef,
        label: DocumentLabel,
    ) -> Result<TxHandle, LedgerError> {
        self.ledger
            .submit(subject, RegistryCall::AppendDocument { content_ref, label })
            .await
    }

    /// Submit an attestation of `subject`'s document at `index`.
    pub async fn attest_document(
        &self,
        submitter: &Identity,
        subject: &Identity,
        index: u64,
    ) -> Result<TxHandle, LedgerError> {
        self.ledger
            .submit(
                submitter,
                RegistryCall::AttestDocument {
                    subject: subject.clone(),
                    index,
                },
            )
            .await
    }

    /// Submit an issuer registration.
    pub async fn register_issuer(
        &self,
        submitter: &Identity,
        identity: &Identity,
    ) -> Result<TxHandle, LedgerError> {
        self.ledger
            .submit(
                submitter,
                RegistryCall::RegisterIssuer {
                    identity: identity.clone(),
                },
            )
            .await
    }

    /// Poll until `handle` is finalized, reverted, or `policy.max_wait` elapses.
    ///
    /// A revert is returned as [`LedgerError::Rejected`] with the ledger's
    /// reason. Running out of time yields [`Finality::Abandoned`]; the
    /// transition may still commit afterwards.
    pub async fn await_finality(
        &self,
        handle: TxHandle,
        policy: &AwaitPolicy,
    ) -> Result<Finality, LedgerError> {
        let started = Instant::now();
        loop {
            match self.ledger.status(&handle).await? {
                TxStatus::Finalized { block } => {
                    return Ok(Finality::Finalized(TxReceipt {
                        handle,
                        block,
                        observed_at: Utc::now(),
                    }));
                }
                TxStatus::Reverted { reason } => {
                    tracing::warn!(%handle, %reason, "transition reverted");
                    return Err(LedgerError::Rejected { reason });
                }
                TxStatus::Pending => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= policy.max_wait {
                tracing::warn!(%handle, waited_ms = elapsed.as_millis() as u64, "stopped awaiting finality");
                return Ok(Finality::Abandoned(handle));
            }
            sleep(policy.poll_interval.min(policy.max_wait - elapsed)).await;
        }
    }
}
