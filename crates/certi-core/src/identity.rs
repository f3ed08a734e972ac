//! # Participant Identity
//!
//! An identity is an EVM account address: `0x` followed by 40 hex digits.
//! It is both the primary key of a participant and the capability token the
//! ledger checks when a transition is submitted.
//!
//! ## Canonical Form
//!
//! Addresses are compared case-insensitively. The canonical (stored,
//! displayed, compared) form is lowercase, so a checksummed address and its
//! lowercase spelling are the same `Identity`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Number of hex digits after the `0x` prefix.
const ADDRESS_HEX_LEN: usize = 40;

/// A validated participant identity in canonical lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parse and normalize an address string.
    ///
    /// Surrounding whitespace is ignored. The zero address parses
    /// successfully; use [`Identity::parse_participant`] where it must be
    /// refused.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| IdentityError::Malformed {
                input: input.to_string(),
            })?;
        if digits.len() != ADDRESS_HEX_LEN {
            return Err(IdentityError::Malformed {
                input: input.to_string(),
            });
        }
        if let Some(found) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(IdentityError::InvalidCharacter {
                input: input.to_string(),
                found,
            });
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Parse an address that must name a real participant (not the zero address).
    pub fn parse_participant(input: &str) -> Result<Self, IdentityError> {
        let identity = Self::parse(input)?;
        if identity.is_zero() {
            return Err(IdentityError::ZeroAddress);
        }
        Ok(identity)
    }

    /// Build an identity from the low 20 bytes of an address.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        let mut out = String::with_capacity(2 + ADDRESS_HEX_LEN);
        out.push_str("0x");
        for b in bytes {
            out.push_str(&format!("{b:02x}"));
        }
        Self(out)
    }

    /// The all-zero address, used by the ledger as the "no attester" sentinel.
    pub fn zero() -> Self {
        Self::from_bytes([0u8; 20])
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    /// The 20 raw address bytes.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        let digits = self.0[2..].as_bytes();
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (nibble(digits[2 * i]) << 4) | nibble(digits[2 * i + 1]);
        }
        out
    }

    /// Canonical lowercase string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display: `0x1234...abcd`.
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

// Only called on digits already validated by `parse`.
fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => 0,
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}
