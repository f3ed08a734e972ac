//! # Registry State Machine
//!
//! The rules the ledger enforces on every transition, independent of any
//! client-side pre-check.
//!
//! ```text
//! Document:  (appended) ──▶ Unverified ──attest──▶ Verified
//!                                          ▲          │
//!                                          └─attest───┘  (no-op)
//! Issuer set: grows only; re-adding a member is a no-op.
//! Owner:      fixed at genesis.
//! ```
//!
//! ## Invariants
//!
//! - The Nth document appended for a subject has `index == N - 1`.
//! - Document counts never decrease; documents are never removed.
//! - `verified` flips once; `attested_by` keeps the first attester.
//! - A reverted transition leaves the state untouched.

use std::collections::{BTreeMap, BTreeSet};

use certi_core::{authorize, Action, Document, Identity, Role};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::RegistryCall;

/// Revert reason for issuer registration by a non-owner.
pub const REVERT_NOT_OWNER: &str = "caller is not the owner";
/// Revert reason for attestation by a plain identity.
pub const REVERT_NOT_ISSUER: &str = "caller is not an issuer";
/// Revert reason for attestation of a document that does not exist.
pub const REVERT_INDEX_OUT_OF_RANGE: &str = "document index out of range";
/// Revert reason for registering the zero address.
pub const REVERT_ZERO_ISSUER: &str = "issuer cannot be the zero address";

/// Full registry state: owner, issuer set, and per-subject documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    owner: Identity,
    issuers: BTreeSet<Identity>,
    documents: BTreeMap<Identity, Vec<Document>>,
}

impl RegistryState {
    /// Create the registry with its owner. The issuer set starts empty.
    pub fn genesis(owner: Identity) -> Self {
        Self {
            owner,
            issuers: BTreeSet::new(),
            documents: BTreeMap::new(),
        }
    }

    /// The genesis owner.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Whether `identity` is a registered issuer.
    pub fn is_issuer(&self, identity: &Identity) -> bool {
        self.issuers.contains(identity)
    }

    /// Registered issuers in canonical order.
    pub fn issuers(&self) -> impl Iterator<Item = &Identity> {
        self.issuers.iter()
    }

    /// Role of `identity` against this state.
    pub fn role_of(&self, identity: &Identity) -> Role {
        Role::classify(identity, &self.owner, self.is_issuer(identity))
    }

    /// Number of documents for `subject`.
    pub fn document_count(&self, subject: &Identity) -> u64 {
        self.documents
            .get(subject)
            .map_or(0, |docs| docs.len() as u64)
    }

    /// Document at `index` for `subject`.
    pub fn document_at(&self, subject: &Identity, index: u64) -> Result<&Document, LedgerError> {
        let docs = self.documents.get(subject).map(Vec::as_slice).unwrap_or(&[]);
        usize::try_from(index)
            .ok()
            .and_then(|i| docs.get(i))
            .ok_or_else(|| LedgerError::IndexOutOfRange {
                subject: subject.clone(),
                index,
                count: docs.len() as u64,
            })
    }

    /// Execute `call` as `sender`.
    ///
    /// Returns the revert reason when the transition is refused; the state
    /// is unchanged in that case.
    pub fn apply(&mut self, sender: &Identity, call: &RegistryCall) -> Result<(), String> {
        match call {
            RegistryCall::RegisterIssuer { identity } => {
                authorize(self.role_of(sender), Action::RegisterIssuer)
                    .map_err(|_| REVERT_NOT_OWNER.to_string())?;
                if identity.is_zero() {
                    return Err(REVERT_ZERO_ISSUER.to_string());
                }
                self.issuers.insert(identity.clone());
                Ok(())
            }
            RegistryCall::AppendDocument { content_ref, label } => {
                let docs = self.documents.entry(sender.clone()).or_default();
                let index = docs.len() as u64;
                docs.push(Document::unverified(index, content_ref.clone(), label.clone()));
                Ok(())
            }
            RegistryCall::AttestDocument { subject, index } => {
                authorize(self.role_of(sender), Action::AttestDocument)
                    .map_err(|_| REVERT_NOT_ISSUER.to_string())?;
                let doc = self
                    .documents
                    .get_mut(subject)
                    .and_then(|docs| usize::try_from(*index).ok().and_then(|i| docs.get_mut(i)))
                    .ok_or_else(|| REVERT_INDEX_OUT_OF_RANGE.to_string())?;
                if !doc.verified {
                    doc.verified = true;
                    doc.attested_by = Some(sender.clone());
                }
                Ok(())
            }
        }
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
            content_ref: ContentRef::new(format!("ref-{label}")),
            label: DocumentLabel::new(label).unwrap(),
        }
    }

    #[test]
    fn appended_indices_are_sequential_per_subject() {
        let mut state = RegistryState::genesis(id(1));
        let (u1, u2) = (id(10), id(11));
        for n in 0..5 {
            state.apply(&u1, &append(&format!("doc{n}"))).unwrap();
        }
        state.apply(&u2, &append("other")).unwrap();

        assert_eq!(state.document_count(&u1), 5);
        assert_eq!(state.document_count(&u2), 1);
        for i in 0..5 {
            assert_eq!(state.document_at(&u1, i).unwrap().index, i);
        }
        assert_eq!(state.document_at(&u2, 0).unwrap().index, 0);
    }

    #[test]
    fn out_of_range_read_reports_count() {
        let mut state = RegistryState::genesis(id(1));
        state.apply(&id(10), &append("a")).unwrap();
        match state.document_at(&id(10), 1) {
            Err(LedgerError::IndexOutOfRange { index, count, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(count, 1);
            }
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
        assert!(state.document_at(&id(99), 0).is_err());
    }

    #[test]
    fn only_owner_registers_issuers_and_registration_is_idempotent() {
        let owner = id(1);
        let mut state = RegistryState::genesis(owner.clone());

        let err = state
            .apply(&id(5), &RegistryCall::RegisterIssuer { identity: id(5) })
            .unwrap_err();
        assert_eq!(err, REVERT_NOT_OWNER);
        assert!(!state.is_issuer(&id(5)));

        let call = RegistryCall::RegisterIssuer { identity: id(2) };
        state.apply(&owner, &call).unwrap();
        state.apply(&owner, &call).unwrap();
        assert_eq!(state.issuers().count(), 1);
        assert_eq!(state.role_of(&id(2)), Role::Issuer);
    }

    #[test]
    fn issuer_cannot_register_issuers() {
        let owner = id(1);
        let mut state = RegistryState::genesis(owner.clone());
        state
            .apply(&owner, &RegistryCall::RegisterIssuer { identity: id(2) })
            .unwrap();
        let err = state
            .apply(&id(2), &RegistryCall::RegisterIssuer { identity: id(3) })
            .unwrap_err();
        assert_eq!(err, REVERT_NOT_OWNER);
    }

    #[test]
    fn zero_address_cannot_become_issuer() {
        let owner = id(1);
        let mut state = RegistryState::genesis(owner.clone());
        let err = state
            .apply(
                &owner,
                &RegistryCall::RegisterIssuer {
                    identity: Identity::zero(),
                },
            )
            .unwrap_err();
        assert_eq!(err, REVERT_ZERO_ISSUER);
    }

    #[test]
    fn attestation_is_monotonic_and_keeps_first_attester() {
        let owner = id(1);
        let (issuer_a, issuer_b, user) = (id(2), id(3), id(10));
        let mut state = RegistryState::genesis(owner.clone());
        for issuer in [&issuer_a, &issuer_b] {
            state
                .apply(
                    &owner,
                    &RegistryCall::RegisterIssuer {
                        identity: issuer.clone(),
                    },
                )
                .unwrap();
        }
        state.apply(&user, &append("Diploma")).unwrap();

        let attest = RegistryCall::AttestDocument {
            subject: user.clone(),
            index: 0,
        };
        state.apply(&issuer_a, &attest).unwrap();
        state.apply(&issuer_b, &attest).unwrap();

        let doc = state.document_at(&user, 0).unwrap();
        assert!(doc.verified);
        assert_eq!(doc.attested_by, Some(issuer_a));
    }

    #[test]
    fn plain_attestation_reverts_without_state_change() {
        let mut state = RegistryState::genesis(id(1));
        let user = id(10);
        state.apply(&user, &append("Diploma")).unwrap();
        let before = state.clone();

        let err = state
            .apply(
                &id(20),
                &RegistryCall::AttestDocument {
                    subject: user.clone(),
                    index: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err, REVERT_NOT_ISSUER);
        assert_eq!(state, before);
    }

    #[test]
    fn owner_may_attest_but_not_out_of_range() {
        let owner = id(1);
        let user = id(10);
        let mut state = RegistryState::genesis(owner.clone());
        state.apply(&user, &append("Diploma")).unwrap();

        let err = state
            .apply(
                &owner,
                &RegistryCall::AttestDocument {
                    subject: user.clone(),
                    index: 4,
                },
            )
            .unwrap_err();
        assert_eq!(err, REVERT_INDEX_OUT_OF_RANGE);

        state
            .apply(
                &owner,
                &RegistryCall::AttestDocument {
                    subject: user.clone(),
                    index: 0,
                },
            )
            .unwrap();
        assert_eq!(state.document_at(&user, 0).unwrap().attested_by, Some(owner));
    }
}
