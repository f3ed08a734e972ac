//! The blob store trait seam.

use async_trait::async_trait;
use certi_core::ContentRef;

use crate::error::BlobError;

/// Raw bytes to store, with the file name the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPayload {
    /// Original file name; used only as upload metadata.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl BlobPayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Content-addressed store: put bytes, get a reference.
///
/// Callers must not assume that identical bytes yield identical references.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Store `payload` and return its reference.
    async fn put(&self, payload: BlobPayload) -> Result<ContentRef, BlobError>;
}
