//! # Credential Workflows
//!
//! Sequences the registry client, role resolver, and blob store into the
//! four user-facing flows:
//!
//! | Flow                 | Who            | Steps                                          |
//! |----------------------|----------------|------------------------------------------------|
//! | self-upload          | anyone         | put → append → await → refresh                 |
//! | issuer verification  | owner, issuers | resolve → enumerate → attest → await → refresh |
//! | public lookup        | anyone         | enumerate                                      |
//! | issuer registration  | owner          | parse → resolve → register → await             |
//!
//! Role checks here are advisory; the ledger refuses the same transitions
//! on its own. Dependent steps only run after the previous transition is
//! observed as finalized.

use std::sync::Arc;

use certi_blob::{BlobPayload, BlobStore, GatewayLocator};
use certi_core::{authorize, Action, ContentRef, Document, DocumentLabel, Identity, Role, ValidationError};
use certi_ledger::{
    AwaitPolicy, Finality, IdentityResolver, RegistryClient, RegistryLedger, TxHandle, TxReceipt,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::WorkflowError;

// ─── View types ─────────────────────────────────────────────────────────────

/// A document together with where to fetch its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedDocument {
    pub document: Document,
    pub locator: String,
}

/// What the public sees about a document's attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Endorsement {
    /// Attested; the bytes are offered for retrieval.
    Verified {
        issuer: Option<Identity>,
        locator: String,
    },
    /// Not attested; no locator is offered.
    NotVerified,
}

/// One row of a public lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupEntry {
    pub index: u64,
    pub label: String,
    pub endorsement: Endorsement,
}

/// A self-upload request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Document name; trimmed, must not be empty.
    pub label: String,
    /// File to store.
    pub payload: BlobPayload,
}

/// Result of a finalized self-upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub content_ref: ContentRef,
    pub receipt: TxReceipt,
    /// The caller's documents as of the refresh after finality, or `None`
    /// if that read failed. The registration is final either way.
    pub portfolio: Option<Vec<LocatedDocument>>,
}

/// Result of a verification request.
#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    /// The document was already verified; nothing was submitted.
    AlreadyVerified { document: Document },
    /// The attestation finalized.
    Verified {
        receipt: TxReceipt,
        /// The subject's remaining unverified documents.
        candidates: Vec<LocatedDocument>,
    },
    /// Stopped waiting; the attestation may still finalize.
    Abandoned { handle: TxHandle },
}

// ─── Orchestrator ───────────────────────────────────────────────────────────

/// Stateless orchestrator over the registry and blob store.
#[derive(Clone)]
pub struct CredentialWorkflows {
    registry: RegistryClient,
    resolver: IdentityResolver,
    blobs: Arc<dyn BlobStore>,
    locator: GatewayLocator,
    policy: AwaitPolicy,
}

impl std::fmt::Debug for CredentialWorkflows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialWorkflows")
            .field("blobs", &self.blobs.name())
            .field("locator", &self.locator)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl CredentialWorkflows {
    pub fn new(
        ledger: Arc<dyn RegistryLedger>,
        blobs: Arc<dyn BlobStore>,
        locator: GatewayLocator,
    ) -> Self {
        Self {
            registry: RegistryClient::new(Arc::clone(&ledger)),
            resolver: IdentityResolver::new(ledger),
            blobs,
            locator,
            policy: AwaitPolicy::default(),
        }
    }

    /// Replace the finality polling policy.
    pub fn with_await_policy(mut self, policy: AwaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    pub fn locator(&self) -> &GatewayLocator {
        &self.locator
    }

    /// Current role of `identity`.
    pub async fn resolve_role(&self, identity: &Identity) -> Result<Role, WorkflowError> {
        Ok(self.resolver.resolve_role(identity).await?)
    }

    async fn require(&self, caller: &Identity, action: Action) -> Result<Role, WorkflowError> {
        let role = self.resolve_role(caller).await?;
        authorize(role, action)?;
        Ok(role)
    }

    fn locate(&self, document: Document) -> LocatedDocument {
        let locator = self.locator.locate(&document.content_ref);
        LocatedDocument { document, locator }
    }

    /// Store a file and register it as the caller's next document.
    ///
    /// Any failure after the blob is stored and before the registration
    /// finalizes is reported as [`WorkflowError::OrphanedBlob`]; the whole
    /// upload must be retried. Once finalized the upload succeeds, even if
    /// the portfolio refresh does not.
    pub async fn upload(
        &self,
        caller: &Identity,
        request: UploadRequest,
    ) -> Result<UploadOutcome, WorkflowError> {
        let label = DocumentLabel::new(&request.label)?;
        if request.payload.is_empty() {
            return Err(ValidationError::EmptyPayload.into());
        }

        let content_ref = self.blobs.put(request.payload).await?;
        info!(%caller, %content_ref, store = self.blobs.name(), "blob stored");

        let receipt = match self.append_and_await(caller, &content_ref, label).await {
            Ok(receipt) => receipt,
            Err(cause) => {
                warn!(%caller, %content_ref, error = %cause, "blob orphaned, registration not finalized");
                return Err(WorkflowError::orphaned(content_ref, cause));
            }
        };
        info!(%caller, %content_ref, handle = %receipt.handle, block = receipt.block, "document registered");

        let portfolio = match self.portfolio(caller).await {
            Ok(portfolio) => Some(portfolio),
            Err(e) => {
                warn!(%caller, %content_ref, error = %e, "portfolio refresh failed after registration");
                None
            }
        };
        Ok(UploadOutcome {
            content_ref,
            receipt,
            portfolio,
        })
    }

    async fn append_and_await(
        &self,
        caller: &Identity,
        content_ref: &ContentRef,
        label: DocumentLabel,
    ) -> Result<TxReceipt, WorkflowError> {
        let handle = self
            .registry
            .append_document(caller, content_ref.clone(), label)
            .await?;
        match self.registry.await_finality(handle, &self.policy).await? {
            Finality::Finalized(receipt) => Ok(receipt),
            Finality::Abandoned(handle) => Err(WorkflowError::Unfinalized { handle }),
        }
    }

    /// Every document of the caller, each with its locator.
    pub async fn portfolio(&self, caller: &Identity) -> Result<Vec<LocatedDocument>, WorkflowError> {
        let documents = self.registry.documents(caller).await?;
        Ok(documents.into_iter().map(|d| self.locate(d)).collect())
    }

    /// Unverified documents of `subject`, for an owner or issuer to inspect.
    pub async fn verification_candidates(
        &self,
        caller: &Identity,
        subject: &Identity,
    ) -> Result<Vec<LocatedDocument>, WorkflowError> {
        self.require(caller, Action::AttestDocument).await?;
        self.unverified(subject).await
    }

    async fn unverified(&self, subject: &Identity) -> Result<Vec<LocatedDocument>, WorkflowError> {
        let documents = self.registry.documents(subject).await?;
        Ok(documents
            .into_iter()
            .filter(|d| !d.verified)
            .map(|d| self.locate(d))
            .collect())
    }

    /// Attest `subject`'s document at `index`.
    ///
    /// Re-reads the document first; an already verified document is
    /// reported without submitting anything.
    pub async fn verify(
        &self,
        caller: &Identity,
        subject: &Identity,
        index: u64,
    ) -> Result<VerifyOutcome, WorkflowError> {
        let role = self.require(caller, Action::AttestDocument).await?;

        let document = self.registry.document_at(subject, index).await?;
        if document.verified {
            info!(%caller, %subject, index, "document already verified, nothing submitted");
            return Ok(VerifyOutcome::AlreadyVerified { document });
        }

        let handle = self.registry.attest_document(caller, subject, index).await?;
        match self.registry.await_finality(handle, &self.policy).await? {
            Finality::Finalized(receipt) => {
                info!(%caller, %role, %subject, index, handle = %receipt.handle, "document verified");
                let candidates = self.unverified(subject).await?;
                Ok(VerifyOutcome::Verified {
                    receipt,
                    candidates,
                })
            }
            Finality::Abandoned(handle) => Ok(VerifyOutcome::Abandoned { handle }),
        }
    }

    /// Public view of `subject`'s documents. No role check.
    ///
    /// Locators are offered only for verified documents.
    pub async fn lookup(&self, subject: &Identity) -> Result<Vec<LookupEntry>, WorkflowError> {
        let documents = self.registry.documents(subject).await?;
        Ok(documents
            .into_iter()
            .map(|d| {
                let endorsement = if d.verified {
                    Endorsement::Verified {
                        issuer: d.attested_by.clone(),
                        locator: self.locator.locate(&d.content_ref),
                    }
                } else {
                    Endorsement::NotVerified
                };
                LookupEntry {
                    index: d.index,
                    label: d.label,
                    endorsement,
                }
            })
            .collect())
    }

    /// [`lookup`](Self::lookup) for an unvalidated subject string.
    pub async fn lookup_str(&self, subject: &str) -> Result<Vec<LookupEntry>, WorkflowError> {
        let subject = parse_subject(subject)?;
        self.lookup(&subject).await
    }

    /// Add `candidate` to the issuer set. Owner only.
    ///
    /// The candidate is validated before any ledger traffic.
    pub async fn register_issuer(
        &self,
        caller: &Identity,
        candidate: &str,
    ) -> Result<Finality, WorkflowError> {
        let issuer = Identity::parse_participant(candidate)?;
        self.require(caller, Action::RegisterIssuer).await?;

        let handle = self.registry.register_issuer(caller, &issuer).await?;
        let finality = self.registry.await_finality(handle, &self.policy).await?;
        if finality.is_finalized() {
            info!(%caller, %issuer, "issuer registered");
        }
        Ok(finality)
    }
}

/// Validate a subject identity typed by a user.
pub fn parse_subject(input: &str) -> Result<Identity, WorkflowError> {
    Ok(Identity::parse(input)?)
}
