//! Retrieval locators for stored blobs.

use certi_core::ContentRef;
use url::Url;

use crate::config::ConfigError;

/// Public Pinata gateway.
pub const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs";

/// Builds `{base}/{ref}` retrieval locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayLocator {
    base: String,
}

impl GatewayLocator {
    /// Trailing slashes on `base` are dropped.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Read `CERTI_GATEWAY_URL`, falling back to [`DEFAULT_GATEWAY`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("CERTI_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY.into());
        Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("CERTI_GATEWAY_URL".into(), e.to_string()))?;
        Ok(Self::new(raw))
    }

    /// Gateway base without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Retrieval URL for `content_ref`.
    pub fn locate(&self, content_ref: &ContentRef) -> String {
        format!("{}/{}", self.base, content_ref)
    }
}

impl Default for GatewayLocator {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY)
    }
}
