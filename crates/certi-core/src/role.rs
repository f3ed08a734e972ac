//! # Roles and Authorization
//!
//! A role is derived from registry state at query time; nothing stores it.
//!
//! ```text
//! caller == owner          → Owner
//! caller ∈ issuer set      → Issuer
//! otherwise                → Plain
//! ```
//!
//! ## Permission Table
//!
//! | Action           | Owner | Issuer | Plain |
//! |------------------|-------|--------|-------|
//! | AppendDocument   | yes   | yes    | yes   |
//! | AttestDocument   | yes   | yes    | no    |
//! | RegisterIssuer   | yes   | no     | no    |
//! | Lookup           | yes   | yes    | yes   |
//!
//! Appends are always made for the submitter itself; the ledger keys the
//! new document by the sender, so there is no "append for someone else".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AccessDenied;
use crate::identity::Identity;

/// Classification of an identity against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single identity fixed at registry genesis.
    Owner,
    /// Member of the append-only issuer set.
    Issuer,
    /// Any other identity.
    Plain,
}

impl Role {
    /// Classify `subject` given the registry owner and its issuer membership.
    ///
    /// The owner check takes precedence: an owner that is also in the issuer
    /// set is still `Owner`.
    pub fn classify(subject: &Identity, owner: &Identity, is_issuer: bool) -> Self {
        if subject == owner {
            Self::Owner
        } else if is_issuer {
            Self::Issuer
        } else {
            Self::Plain
        }
    }

    /// Whether this role may perform `action`.
    pub fn permits(self, action: Action) -> bool {
        match action {
            Action::AppendDocument | Action::Lookup => true,
            Action::AttestDocument => matches!(self, Self::Owner | Self::Issuer),
            Action::RegisterIssuer => matches!(self, Self::Owner),
        }
    }

    /// Whether this role may attest documents.
    pub fn can_attest(self) -> bool {
        self.permits(Action::AttestDocument)
    }

    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Issuer => "issuer",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry operation subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Register a document for oneself.
    AppendDocument,
    /// Attest (verify) a subject's document.
    AttestDocument,
    /// Add an identity to the issuer set.
    RegisterIssuer,
    /// Read a subject's documents.
    Lookup,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AppendDocument => "append documents",
            Self::AttestDocument => "attest documents",
            Self::RegisterIssuer => "register issuers",
            Self::Lookup => "look up documents",
        };
        f.write_str(s)
    }
}

/// Check `role` against `action`, returning [`AccessDenied`] on refusal.
pub fn authorize(role: Role, action: Action) -> Result<(), AccessDenied> {
    if role.permits(action) {
        Ok(())
    } else {
        Err(AccessDenied { role, action })
    }
}
