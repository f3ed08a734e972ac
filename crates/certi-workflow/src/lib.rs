//! # certi-workflow — Credential Workflow Orchestrator
//!
//! [`CredentialWorkflows`] is the only entry point user surfaces need. It
//! holds the registry client, the role resolver, the blob store, and the
//! gateway locator, and keeps no mutable state between calls.
//!
//! ## Consistency
//!
//! Full re-fetch is the only consistency strategy: every flow that changes
//! the registry awaits finality and then re-enumerates. A wait that is
//! abandoned does not cancel the transition; the next refresh shows it.

#![deny(unsafe_code)]

pub mod error;
pub mod workflows;

pub use error::WorkflowError;
pub use workflows::{
    parse_subject, CredentialWorkflows, Endorsement, LocatedDocument, LookupEntry, UploadOutcome,
    UploadRequest, VerifyOutcome,
};
