//! Blob store error types.

/// Errors from blob store adapters.
///
/// No adapter retries; every variant reaches the caller on the first failure.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The store could not be reached.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with a non-success status.
    #[error("blob store returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The store's response did not carry a usable reference.
    #[error("failed to read blob store response: {0}")]
    Deserialization(String),

    /// Local filesystem failure.
    #[error("blob store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
