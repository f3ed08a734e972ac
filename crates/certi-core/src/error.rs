//! # Error Types
//!
//! Leaf-level errors raised while constructing domain values. Higher layers
//! wrap these into their own enums via `#[from]`.

use thiserror::Error;

use crate::role::{Action, Role};

/// A string could not be parsed as a participant identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Input was empty or whitespace.
    #[error("identity is empty")]
    Empty,

    /// Input lacks the `0x` prefix or has the wrong length.
    #[error("malformed identity {input:?}: expected 0x followed by 40 hex digits")]
    Malformed {
        /// The rejected input, verbatim.
        input: String,
    },

    /// Input contains a character that is not a hex digit.
    #[error("malformed identity {input:?}: invalid character {found:?}")]
    InvalidCharacter {
        /// The rejected input, verbatim.
        input: String,
        /// First offending character.
        found: char,
    },

    /// The zero address is reserved as the "no attester" sentinel.
    #[error("the zero address is not a participant identity")]
    ZeroAddress,
}

/// Client-checkable input validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Document label was empty after trimming.
    #[error("document label must not be empty")]
    EmptyLabel,

    /// Upload payload had no bytes.
    #[error("document payload must not be empty")]
    EmptyPayload,
}

/// A role lacks permission for an action.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("role {role} may not {action}")]
pub struct AccessDenied {
    /// Role of the caller at decision time.
    pub role: Role,
    /// Action that was refused.
    pub action: Action,
}
