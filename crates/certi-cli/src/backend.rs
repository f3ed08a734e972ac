//! # Backend Wiring
//!
//! Builds a [`CredentialWorkflows`] for the selected backend.
//!
//! - `local`: the registry is an in-process ledger persisted as
//!   `{state_dir}/ledger.json`; blobs live in `{state_dir}/blobs/` and are
//!   located with `file://` URLs. There is no signing session: any
//!   `--caller` may submit, and the ledger's own rules decide.
//! - `evm`: the registry is the deployed contract behind `CERTI_RPC_URL`,
//!   blobs go to Pinata. Only `CERTI_SIGNER` can submit.
//!
//! The local ledger file is rewritten after every command that may have
//! changed it. Concurrent `certi` processes on one state directory are not
//! coordinated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use certi_blob::{
    BlobError, BlobPayload, BlobStore, FsBlobStore, GatewayLocator, PinataBlobStore, PinataConfig,
};
use certi_core::{ContentRef, Identity};
use certi_ledger::{
    AwaitPolicy, EvmRegistryConfig, EvmRegistryLedger, InMemoryLedger, LedgerSnapshot, Sealing,
};
use certi_workflow::CredentialWorkflows;
use clap::ValueEnum;

const LEDGER_FILE: &str = "ledger.json";
const BLOB_DIR: &str = "blobs";

/// Which registry and blob store to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// JSON-file ledger and filesystem blobs under the state directory.
    Local,
    /// EVM JSON-RPC registry and Pinata blobs, configured from the environment.
    Evm,
}

/// An opened backend.
#[derive(Debug)]
pub struct Session {
    pub flows: CredentialWorkflows,
    /// Identity used when `--caller` is absent.
    pub default_caller: Option<Identity>,
    local: Option<LocalLedgerFile>,
}

impl Session {
    /// Write back local ledger state. No-op for remote backends.
    pub fn persist(&self) -> Result<()> {
        match &self.local {
            Some(file) => file.save(),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
struct LocalLedgerFile {
    path: PathBuf,
    ledger: InMemoryLedger,
}

impl LocalLedgerFile {
    fn save(&self) -> Result<()> {
        write_snapshot(&self.path, &self.ledger.snapshot())
    }
}

fn write_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    let json = serde_json::to_vec_pretty(snapshot).context("serializing ledger state")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Create a fresh local registry owned by `owner`.
pub fn genesis(state_dir: &Path, owner: Identity, force: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(state_dir)
        .with_context(|| format!("creating {}", state_dir.display()))?;
    let path = state_dir.join(LEDGER_FILE);
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to start a new registry",
            path.display()
        );
    }
    write_snapshot(&path, &InMemoryLedger::genesis(owner).snapshot())?;
    Ok(path)
}

/// Open the local backend rooted at `state_dir`.
pub fn open_local(state_dir: &Path, policy: AwaitPolicy) -> Result<Session> {
    let path = state_dir.join(LEDGER_FILE);
    let raw = std::fs::read(&path).with_context(|| {
        format!(
            "reading {} (run `certi genesis --owner <ADDRESS>` first)",
            path.display()
        )
    })?;
    let snapshot: LedgerSnapshot =
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let ledger = InMemoryLedger::from_snapshot(snapshot, Sealing::Automatic);

    let root = std::fs::canonicalize(state_dir)
        .with_context(|| format!("resolving {}", state_dir.display()))?;
    let blob_dir = root.join(BLOB_DIR);
    let locator = GatewayLocator::new(format!("file://{}", blob_dir.display()));
    let flows = CredentialWorkflows::new(
        Arc::new(ledger.clone()),
        Arc::new(FsBlobStore::new(blob_dir)),
        locator,
    )
    .with_await_policy(policy);

    Ok(Session {
        flows,
        default_caller: None,
        local: Some(LocalLedgerFile { path, ledger }),
    })
}

/// Stand-in store when Pinata credentials are absent; reads still work.
#[derive(Debug)]
struct UnconfiguredBlobStore {
    reason: String,
}

#[async_trait]
impl BlobStore for UnconfiguredBlobStore {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn put(&self, _payload: BlobPayload) -> Result<ContentRef, BlobError> {
        Err(BlobError::Unavailable(self.reason.clone()))
    }
}

/// Open the EVM backend from environment configuration.
pub fn open_evm(policy: AwaitPolicy) -> Result<Session> {
    let config = EvmRegistryConfig::from_env().context("loading registry configuration")?;
    tracing::debug!(?config, "opening EVM registry");
    let default_caller = config.signer.clone();
    let ledger = EvmRegistryLedger::new(config)?;

    let blobs: Arc<dyn BlobStore> = match PinataConfig::from_env() {
        Ok(pinata) => Arc::new(PinataBlobStore::new(pinata)?),
        Err(e) => {
            tracing::debug!(error = %e, "Pinata not configured, uploads disabled");
            Arc::new(UnconfiguredBlobStore {
                reason: e.to_string(),
            })
        }
    };
    let locator = GatewayLocator::from_env()?;

    Ok(Session {
        flows: CredentialWorkflows::new(Arc::new(ledger), blobs, locator)
            .with_await_policy(policy),
        default_caller,
        local: None,
    })
}

/// Open `backend`.
pub fn open(backend: Backend, state_dir: &Path, policy: AwaitPolicy) -> Result<Session> {
    match backend {
        Backend::Local => open_local(state_dir, policy),
        Backend::Evm => open_evm(policy),
    }
}
