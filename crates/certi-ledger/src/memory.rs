//! # In-Process Reference Ledger
//!
//! A ledger that runs [`RegistryState`] behind the same two-phase surface as
//! a real chain. Submissions queue in a mempool and are applied in FIFO
//! order when a block is sealed; each seal advances the height by one.
//!
//! ## Sealing
//!
//! - [`Sealing::Automatic`]: every status poll seals the mempool first, so a
//!   submission is final by the time anyone asks. Used by the CLI's local
//!   backend and most tests.
//! - [`Sealing::Manual`]: nothing finalizes until [`InMemoryLedger::seal`]
//!   is called. Models a transition that commits after the submitter has
//!   stopped waiting.
//!
//! The whole chain sits behind one `parking_lot::Mutex` that is never held
//! across an `.await`, so index assignment on append is atomic.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use certi_core::{Document, Identity};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::ledger::{RegistryCall, RegistryLedger};
use crate::state::RegistryState;
use crate::tx::{TxHandle, TxStatus};

/// When queued submissions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sealing {
    /// Seal on every status poll.
    #[default]
    Automatic,
    /// Seal only on explicit [`InMemoryLedger::seal`].
    Manual,
}

/// Serializable finalized state of an [`InMemoryLedger`].
///
/// Queued, unsealed submissions are not part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Number of sealed blocks.
    pub height: u64,
    /// Registry state as of `height`.
    pub registry: RegistryState,
}

#[derive(Debug)]
struct Queued {
    handle: TxHandle,
    sender: Identity,
    call: RegistryCall,
}

#[derive(Debug)]
struct Chain {
    registry: RegistryState,
    height: u64,
    mempool: VecDeque<Queued>,
    // Never pruned. Not part of a snapshot, so the CLI's local backend
    // starts each process with an empty map.
    receipts: HashMap<TxHandle, TxStatus>,
}

impl Chain {
    fn seal(&mut self) -> usize {
        if self.mempool.is_empty() {
            return 0;
        }
        self.height += 1;
        let block = self.height;
        let mut applied = 0;
        while let Some(tx) = self.mempool.pop_front() {
            let status = match self.registry.apply(&tx.sender, &tx.call) {
                Ok(()) => {
                    tracing::debug!(handle = %tx.handle, call = tx.call.name(), block, "transition finalized");
                    TxStatus::Finalized { block }
                }
                Err(reason) => {
                    tracing::debug!(handle = %tx.handle, call = tx.call.name(), %reason, "transition reverted");
                    TxStatus::Reverted { reason }
                }
            };
            self.receipts.insert(tx.handle, status);
            applied += 1;
        }
        applied
    }
}

/// Reference ledger enforcing the registry rules in-process.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    chain: Arc<Mutex<Chain>>,
    sealing: Sealing,
    online: Arc<AtomicBool>,
}

impl InMemoryLedger {
    /// Create a ledger at genesis with automatic sealing.
    pub fn genesis(owner: Identity) -> Self {
        Self::with_sealing(owner, Sealing::Automatic)
    }

    /// Create a ledger at genesis with an explicit sealing mode.
    pub fn with_sealing(owner: Identity, sealing: Sealing) -> Self {
        Self::from_snapshot(
            LedgerSnapshot {
                height: 0,
                registry: RegistryState::genesis(owner),
            },
            sealing,
        )
    }

    /// Restore a ledger from a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot, sealing: Sealing) -> Self {
        Self {
            chain: Arc::new(Mutex::new(Chain {
                registry: snapshot.registry,
                height: snapshot.height,
                mempool: VecDeque::new(),
                receipts: HashMap::new(),
            })),
            sealing,
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Capture the finalized state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let chain = self.chain.lock();
        LedgerSnapshot {
            height: chain.height,
            registry: chain.registry.clone(),
        }
    }

    /// Apply every queued submission in one block. Returns how many were applied.
    pub fn seal(&self) -> usize {
        self.chain.lock().seal()
    }

    /// Number of queued, unsealed submissions.
    pub fn pending_count(&self) -> usize {
        self.chain.lock().mempool.len()
    }

    /// Take the ledger offline or bring it back. Offline, every call fails
    /// with [`LedgerError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), LedgerError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("in-memory ledger is offline".into()))
        }
    }
}

#[async_trait]
impl RegistryLedger for InMemoryLedger {
    async fn owner_of(&self) -> Result<Identity, LedgerError> {
        self.ensure_online()?;
        Ok(self.chain.lock().registry.owner().clone())
    }

    async fn is_issuer(&self, identity: &Identity) -> Result<bool, LedgerError> {
        self.ensure_online()?;
        Ok(self.chain.lock().registry.is_issuer(identity))
    }

    async fn document_count(&self, subject: &Identity) -> Result<u64, LedgerError> {
        self.ensure_online()?;
        Ok(self.chain.lock().registry.document_count(subject))
    }

    async fn document_at(&self, subject: &Identity, index: u64) -> Result<Document, LedgerError> {
        self.ensure_online()?;
        self.chain
            .lock()
            .registry
            .document_at(subject, index)
            .cloned()
    }

    async fn submit(
        &self,
        submitter: &Identity,
        call: RegistryCall,
    ) -> Result<TxHandle, LedgerError> {
        self.ensure_online()?;
        let handle = TxHandle::new(format!("0x{}", Uuid::new_v4().simple()));
        let mut chain = self.chain.lock();
        chain.receipts.insert(handle.clone(), TxStatus::Pending);
        chain.mempool.push_back(Queued {
            handle: handle.clone(),
            sender: submitter.clone(),
            call,
        });
        Ok(handle)
    }

    async fn status(&self, handle: &TxHandle) -> Result<TxStatus, LedgerError> {
        self.ensure_online()?;
        let mut chain = self.chain.lock();
        if self.sealing == Sealing::Automatic {
            chain.seal();
        }
        chain
            .receipts
            .get(handle)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownTransaction(handle.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certi_core::{ContentRef, DocumentLabel};

    fn id(last: u8) -> Identity {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Identity::from_bytes(bytes)
    }

    fn append(label: &str) -> RegistryCall {
        RegistryCall::AppendDocument {
            content_ref: ContentRef::new("QmTest"),
            label: DocumentLabel::new(label).unwrap(),
        }
    }

    #[tokio::test]
    async fn manual_sealing_keeps_submissions_pending() {
        let ledger = InMemoryLedger::with_sealing(id(1), Sealing::Manual);
        let user = id(10);
        let handle = ledger.submit(&user, append("Diploma")).await.unwrap();

        assert_eq!(ledger.status(&handle).await.unwrap(), TxStatus::Pending);
        assert_eq!(ledger.document_count(&user).await.unwrap(), 0);
        assert_eq!(ledger.pending_count(), 1);

        assert_eq!(ledger.seal(), 1);
        assert_eq!(
            ledger.status(&handle).await.unwrap(),
            TxStatus::Finalized { block: 1 }
        );
        assert_eq!(ledger.document_count(&user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn queued_appends_finalize_in_submission_order() {
        let ledger = InMemoryLedger::with_sealing(id(1), Sealing::Manual);
        let user = id(10);
        ledger.submit(&user, append("first")).await.unwrap();
        ledger.submit(&user, append("second")).await.unwrap();
        ledger.seal();

        assert_eq!(ledger.document_at(&user, 0).await.unwrap().label, "first");
        assert_eq!(ledger.document_at(&user, 1).await.unwrap().label, "second");
    }

    #[tokio::test]
    async fn reverted_submission_reports_reason() {
        let ledger = InMemoryLedger::genesis(id(1));
        let handle = ledger
            .submit(&id(7), RegistryCall::RegisterIssuer { identity: id(7) })
            .await
            .unwrap();
        match ledger.status(&handle).await.unwrap() {
            TxStatus::Reverted { reason } => assert_eq!(reason, "caller is not the owner"),
            other => panic!("expected revert, got {other:?}"),
        }
        assert!(!ledger.is_issuer(&id(7)).await.unwrap());
    }

    #[tokio::test]
    async fn offline_ledger_is_unavailable() {
        let ledger = InMemoryLedger::genesis(id(1));
        ledger.set_online(false);
        assert!(matches!(
            ledger.owner_of().await,
            Err(LedgerError::Unavailable(_))
        ));
        assert!(matches!(
            ledger.submit(&id(2), append("x")).await,
            Err(LedgerError::Unavailable(_))
        ));
        ledger.set_online(true);
        assert_eq!(ledger.owner_of().await.unwrap(), id(1));
    }

    #[tokio::test]
    async fn unknown_handle_is_reported() {
        let ledger = InMemoryLedger::genesis(id(1));
        let result = ledger.status(&TxHandle::new("0xnope")).await;
        assert!(matches!(result, Err(LedgerError::UnknownTransaction(_))));
    }

    #[tokio::test]
    async fn snapshot_restores_finalized_state() {
        let ledger = InMemoryLedger::genesis(id(1));
        let handle = ledger.submit(&id(10), append("Diploma")).await.unwrap();
        ledger.status(&handle).await.unwrap();

        let json = serde_json::to_string(&ledger.snapshot()).unwrap();
        let restored: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let ledger = InMemoryLedger::from_snapshot(restored, Sealing::Automatic);

        assert_eq!(ledger.snapshot().height, 1);
        assert_eq!(ledger.document_count(&id(10)).await.unwrap(), 1);
        assert_eq!(ledger.owner_of().await.unwrap(), id(1));
    }
}
