//! # Credential Documents
//!
//! A document is owned by exactly one subject and lives in that subject's
//! append-only sequence. `content_ref` and `label` never change after the
//! append; `verified` flips once from `false` to `true`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::Identity;

/// Opaque reference into the blob store (an IPFS CID or a digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    /// Wrap a reference returned by a blob store or read from the ledger.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Return the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, non-empty document label for new submissions.
///
/// Labels read back from the ledger are plain strings on [`Document`]; this
/// type only guards what this system submits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentLabel(String);

impl DocumentLabel {
    /// Trim and validate a label.
    pub fn new(label: &str) -> Result<Self, ValidationError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentLabel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DocumentLabel> for String {
    fn from(value: DocumentLabel) -> Self {
        value.0
    }
}

impl fmt::Display for DocumentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as observed in a finalized ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Position in the subject's sequence, assigned by the ledger.
    pub index: u64,
    /// Blob store reference.
    pub content_ref: ContentRef,
    /// Human-readable name.
    pub label: String,
    /// Issuer that attested the document, `None` while unverified.
    pub attested_by: Option<Identity>,
    /// Whether an issuer has attested the document.
    pub verified: bool,
}

impl Document {
    /// Build a document from the ledger's raw tuple.
    ///
    /// The ledger reports the zero address when nobody has attested; that
    /// sentinel becomes `None`.
    pub fn from_ledger(
        index: u64,
        content_ref: impl Into<String>,
        label: impl Into<String>,
        attested_by: Identity,
        verified: bool,
    ) -> Self {
        Self {
            index,
            content_ref: ContentRef::new(content_ref),
            label: label.into(),
            attested_by: (!attested_by.is_zero()).then_some(attested_by),
            verified,
        }
    }

    /// A freshly appended, unverified document.
    pub fn unverified(index: u64, content_ref: ContentRef, label: DocumentLabel) -> Self {
        Self {
            index,
            content_ref,
            label: label.into(),
            attested_by: None,
            verified: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_trimmed_and_must_not_be_empty() {
        assert_eq!(DocumentLabel::new("  Diploma ").unwrap().as_str(), "Diploma");
        assert_eq!(DocumentLabel::new("   "), Err(ValidationError::EmptyLabel));
        assert_eq!(DocumentLabel::new(""), Err(ValidationError::EmptyLabel));
    }

    #[test]
    fn zero_attester_maps_to_none() {
        let doc = Document::from_ledger(0, "QmRef", "Diploma", Identity::zero(), false);
        assert_eq!(doc.attested_by, None);
        assert!(!doc.verified);

        let issuer = Identity::parse("0x00000000000000000000000000000000000000b1").unwrap();
        let doc = Document::from_ledger(3, "QmRef", "Transcript", issuer.clone(), true);
        assert_eq!(doc.index, 3);
        assert_eq!(doc.attested_by, Some(issuer));
    }
}
