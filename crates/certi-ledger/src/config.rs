//! EVM registry adapter configuration.
//!
//! Defaults target a local development node and the deployed registry
//! contract. Override via environment variables or explicit construction.

use certi_core::{Identity, IdentityError};
use url::Url;

/// Address of the deployed registry contract.
pub const DEFAULT_REGISTRY_ADDRESS: &str = "0x81298d0A12addC1D3E873169284F54C6dbA1F460";

/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Configuration for [`EvmRegistryLedger`](crate::evm::EvmRegistryLedger).
///
/// Custom `Debug` prints only the RPC origin: hosted endpoints commonly
/// carry an API key in the path.
#[derive(Clone)]
pub struct EvmRegistryConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Registry contract address.
    pub registry_address: Identity,
    /// Account the node signs `eth_sendTransaction` for. `None` means
    /// read-only: every submission fails with `NoSession`.
    pub signer: Option<Identity>,
    /// Blocks (including the one holding the transaction) required before a
    /// transition counts as finalized.
    pub confirmations: u64,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for EvmRegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmRegistryConfig")
            .field("rpc_url", &self.rpc_url.origin().ascii_serialization())
            .field("registry_address", &self.registry_address)
            .field("signer", &self.signer)
            .field("confirmations", &self.confirmations)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl EvmRegistryConfig {
    /// Create a configuration with one confirmation, a 30 s timeout, and no signer.
    pub fn new(rpc_url: Url, registry_address: Identity) -> Self {
        Self {
            rpc_url,
            registry_address,
            signer: None,
            confirmations: 1,
            timeout_secs: 30,
        }
    }

    /// Set the signing account.
    pub fn with_signer(mut self, signer: Identity) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Set the confirmation threshold (minimum 1).
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CERTI_RPC_URL` (default: `http://127.0.0.1:8545`)
    /// - `CERTI_REGISTRY_ADDRESS` (default: the deployed registry)
    /// - `CERTI_SIGNER` (optional)
    /// - `CERTI_CONFIRMATIONS` (default: 1)
    /// - `CERTI_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_url = env_url("CERTI_RPC_URL", DEFAULT_RPC_URL)?;
        let registry_address = match env_identity("CERTI_REGISTRY_ADDRESS")? {
            Some(address) => address,
            None => Identity::parse(DEFAULT_REGISTRY_ADDRESS).map_err(|source| {
                ConfigError::InvalidIdentity {
                    var: "CERTI_REGISTRY_ADDRESS".into(),
                    source,
                }
            })?,
        };

        let mut config = Self::new(rpc_url, registry_address)
            .with_confirmations(env_u64("CERTI_CONFIRMATIONS", 1))
            .with_timeout_secs(env_u64("CERTI_TIMEOUT_SECS", 30));
        config.signer = env_identity("CERTI_SIGNER")?;
        Ok(config)
    }
}

/// Read a URL variable, falling back to `default`.
pub fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Read an unsigned integer variable, falling back to `default` when unset or unparsable.
pub fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_identity(var: &str) -> Result<Option<Identity>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => Identity::parse(&raw)
            .map(Some)
            .map_err(|source| ConfigError::InvalidIdentity {
                var: var.to_string(),
                source,
            }),
        _ => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable did not parse. Holds the variable name and the parse error.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// An address variable is not a valid identity.
    #[error("invalid address in {var}: {source}")]
    InvalidIdentity {
        /// Variable name.
        var: String,
        /// Why the value was refused.
        #[source]
        source: IdentityError,
    },
}
