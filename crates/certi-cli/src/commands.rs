//! # Subcommand Handlers
//!
//! Each handler delegates to [`CredentialWorkflows`] and renders the result
//! as text, or as JSON with `--json`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use certi_blob::BlobPayload;
use certi_core::Identity;
use certi_ledger::Finality;
use certi_workflow::{
    parse_subject, CredentialWorkflows, Endorsement, LocatedDocument, LookupEntry, UploadRequest,
    VerifyOutcome,
};
use clap::Subcommand;
use serde_json::json;

/// CertiChain subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a local registry with the given owner (local backend only).
    Genesis {
        /// Owner identity, fixed for the life of the registry.
        #[arg(long)]
        owner: Identity,
        /// Replace an existing local registry.
        #[arg(long)]
        force: bool,
    },

    /// Show the role of an identity (defaults to the caller).
    Role {
        /// Identity to resolve.
        identity: Option<Identity>,
    },

    /// Store a file and register it as one of the caller's documents.
    Upload {
        /// File to upload.
        #[arg(long)]
        file: PathBuf,
        /// Document name (defaults to the file name).
        #[arg(long)]
        label: Option<String>,
    },

    /// List the caller's own documents with their locators.
    Documents,

    /// List a subject's unverified documents (owner or issuer).
    Candidates {
        /// Subject identity.
        subject: String,
    },

    /// Verify a subject's document (owner or issuer).
    Verify {
        /// Subject identity.
        subject: String,
        /// Index of the document in the subject's list.
        index: u64,
    },

    /// Show a subject's documents as the public sees them.
    Lookup {
        /// Subject identity.
        subject: String,
    },

    /// Add an identity to the issuer set (owner only).
    AddIssuer {
        /// Identity to register.
        identity: String,
    },
}

impl Command {
    /// Whether the command can change registry state.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. } | Self::Verify { .. } | Self::AddIssuer { .. }
        )
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

impl Output {
    fn emit(self, value: serde_json::Value, text: impl FnOnce() -> String) {
        match self {
            Self::Json => println!("{value:#}"),
            Self::Text => println!("{}", text()),
        }
    }
}

fn require_caller(caller: Option<&Identity>) -> Result<&Identity> {
    caller.context("this command needs --caller (or CERTI_SIGNER for the evm backend)")
}

/// Run a registry command. `Genesis` is handled before a session exists.
pub async fn run(
    command: Command,
    flows: &CredentialWorkflows,
    caller: Option<&Identity>,
    output: Output,
) -> Result<()> {
    match command {
        Command::Genesis { .. } => bail!("genesis runs without a registry session"),

        Command::Role { identity } => {
            let identity = match identity.as_ref() {
                Some(identity) => identity,
                None => require_caller(caller)?,
            };
            let role = flows.resolve_role(identity).await?;
            output.emit(json!({"identity": identity, "role": role}), || {
                format!("{identity}: {role}")
            });
        }

        Command::Upload { file, label } => {
            let caller = require_caller(caller)?;
            let request = read_upload(&file, label)?;
            let outcome = flows.upload(caller, request).await?;
            output.emit(
                json!({
                    "content_ref": outcome.content_ref,
                    "tx": outcome.receipt.handle,
                    "block": outcome.receipt.block,
                    "documents": outcome.portfolio,
                }),
                || {
                    let listing = outcome.portfolio.as_deref().map_or_else(
                        || "(document list unavailable; run `certi documents`)".to_string(),
                        render_located,
                    );
                    format!(
                        "registered {} in block {}\n{}",
                        outcome.content_ref, outcome.receipt.block, listing
                    )
                },
            );
        }

        Command::Documents => {
            let caller = require_caller(caller)?;
            let portfolio = flows.portfolio(caller).await?;
            output.emit(json!(portfolio), || render_located(&portfolio));
        }

        Command::Candidates { subject } => {
            let caller = require_caller(caller)?;
            let subject = parse_subject(&subject)?;
            let candidates = flows.verification_candidates(caller, &subject).await?;
            output.emit(json!(candidates), || render_located(&candidates));
        }

        Command::Verify { subject, index } => {
            let caller = require_caller(caller)?;
            let subject = parse_subject(&subject)?;
            match flows.verify(caller, &subject, index).await? {
                VerifyOutcome::AlreadyVerified { document } => output.emit(
                    json!({"status": "already_verified", "document": document}),
                    || format!("document #{index} of {subject} is already verified"),
                ),
                VerifyOutcome::Verified {
                    receipt,
                    candidates,
                } => output.emit(
                    json!({
                        "status": "verified",
                        "tx": receipt.handle,
                        "block": receipt.block,
                        "candidates": candidates,
                    }),
                    || {
                        format!(
                            "verified document #{index} of {subject} in block {}\nremaining:\n{}",
                            receipt.block,
                            render_located(&candidates)
                        )
                    },
                ),
                VerifyOutcome::Abandoned { handle } => output.emit(
                    json!({"status": "pending", "tx": handle}),
                    || format!("stopped waiting for {handle}; it may still be finalized"),
                ),
            }
        }

        Command::Lookup { subject } => {
            let entries = flows.lookup_str(&subject).await?;
            output.emit(json!(entries), || render_lookup(&entries));
        }

        Command::AddIssuer { identity } => {
            let caller = require_caller(caller)?;
            match flows.register_issuer(caller, &identity).await? {
                Finality::Finalized(receipt) => output.emit(
                    json!({"status": "registered", "tx": receipt.handle, "block": receipt.block}),
                    || format!("registered issuer {} in block {}", identity.trim(), receipt.block),
                ),
                Finality::Abandoned(handle) => output.emit(
                    json!({"status": "pending", "tx": handle}),
                    || format!("stopped waiting for {handle}; it may still be finalized"),
                ),
            }
        }
    }
    Ok(())
}

fn read_upload(file: &Path, label: Option<String>) -> Result<UploadRequest> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    Ok(UploadRequest {
        label: label.unwrap_or_else(|| file_name.clone()),
        payload: BlobPayload::new(file_name, bytes),
    })
}

fn render_located(documents: &[LocatedDocument]) -> String {
    if documents.is_empty() {
        return "no documents".to_string();
    }
    documents
        .iter()
        .map(|entry| {
            let doc = &entry.document;
            let status = match (&doc.attested_by, doc.verified) {
                (Some(issuer), true) => format!("verified by {}", issuer.short()),
                (None, true) => "verified".to_string(),
                (_, false) => "not verified".to_string(),
            };
            format!("#{:<3} {:<24} {:<28} {}", doc.index, doc.label, status, entry.locator)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_lookup(entries: &[LookupEntry]) -> String {
    if entries.is_empty() {
        return "no documents".to_string();
    }
    entries
        .iter()
        .map(|entry| match &entry.endorsement {
            Endorsement::Verified { issuer, locator } => {
                let by = issuer
                    .as_ref()
                    .map(|i| format!("verified by {}", i.short()))
                    .unwrap_or_else(|| "verified".to_string());
                format!("#{:<3} {:<24} {:<28} {}", entry.index, entry.label, by, locator)
            }
            Endorsement::NotVerified => {
                format!("#{:<3} {:<24} not verified", entry.index, entry.label)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
