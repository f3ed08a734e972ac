//! Pinata pinning service configuration.

use url::Url;
use zeroize::Zeroizing;

/// Pinata API base URL.
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";

/// Credentials and endpoint for [`PinataBlobStore`](crate::pinata::PinataBlobStore).
///
/// Custom `Debug` implementation redacts the API secret. The secret is
/// zeroed when the config is dropped.
#[derive(Clone)]
pub struct PinataConfig {
    /// API base URL.
    pub api_url: Url,
    /// Value of the `pinata_api_key` header.
    pub api_key: String,
    /// Value of the `pinata_secret_api_key` header.
    pub api_secret: Zeroizing<String>,
    /// Request timeout in seconds. Uploads can be large.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PinataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PinataConfig {
    pub fn new(api_url: Url, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_url,
            api_key: api_key.into(),
            api_secret: Zeroizing::new(api_secret.into()),
            timeout_secs: 60,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PINATA_API_URL` (default: `https://api.pinata.cloud`)
    /// - `PINATA_API_KEY` (required)
    /// - `PINATA_API_SECRET` (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var("PINATA_API_KEY").map_err(|_| ConfigError::Missing("PINATA_API_KEY"))?;
        let api_secret = Zeroizing::new(
            std::env::var("PINATA_API_SECRET")
                .map_err(|_| ConfigError::Missing("PINATA_API_SECRET"))?,
        );
        let raw = std::env::var("PINATA_API_URL").unwrap_or_else(|_| DEFAULT_PINATA_API_URL.into());
        let api_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("PINATA_API_URL".into(), e.to_string()))?;

        Ok(Self {
            api_url,
            api_key,
            api_secret,
            timeout_secs: 60,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    /// A URL variable did not parse. Holds the variable name and the parse error.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
