//! # certi-ledger — Document Registry Client
//!
//! Everything between the credential workflows and the authoritative
//! registry:
//!
//! - [`RegistryLedger`]: the async trait seam for a registry ledger.
//! - [`InMemoryLedger`]: in-process ledger enforcing [`RegistryState`]'s
//!   rules, used for local development and as the test double.
//! - [`EvmRegistryLedger`]: JSON-RPC adapter for the deployed contract,
//!   with its ABI codec in [`abi`].
//! - [`RegistryClient`]: typed reads, submissions, enumeration and
//!   finality polling.
//! - [`IdentityResolver`]: role derivation from the ledger.
//!
//! ## Crate Policy
//!
//! - Access control is the ledger's job; this crate never pre-empts it.
//! - Locks are never held across `.await`.
//! - No `unsafe` code.

#![deny(unsafe_code)]

pub mod abi;
pub mod client;
pub mod config;
pub mod error;
pub mod evm;
pub mod ledger;
pub mod memory;
pub mod resolver;
pub mod state;
pub mod tx;

pub use client::{RegistryClient, MAX_SNAPSHOT_RETRIES};
pub use config::{ConfigError, EvmRegistryConfig};
pub use error::LedgerError;
pub use evm::EvmRegistryLedger;
pub use ledger::{RegistryCall, RegistryLedger};
pub use memory::{InMemoryLedger, LedgerSnapshot, Sealing};
pub use resolver::IdentityResolver;
pub use state::RegistryState;
pub use tx::{AwaitPolicy, Finality, TxHandle, TxReceipt, TxStatus};
