//! # certi-blob — Blob Store Adapters
//!
//! Document bytes never touch the registry. They are written once to a
//! content-addressed store and the registry keeps only the reference.
//!
//! | Store               | Reference            | Used by                    |
//! |---------------------|----------------------|----------------------------|
//! | [`PinataBlobStore`] | IPFS CID (`IpfsHash`)| `evm` backend              |
//! | [`FsBlobStore`]     | SHA-256 hex          | `local` backend            |
//! | [`MemoryBlobStore`] | SHA-256 hex          | tests                      |
//!
//! [`GatewayLocator`] turns a reference into a retrieval URL.
//!
//! ## Crate Policy
//!
//! - No automatic retries. A failed `put` is reported once.
//! - Secrets are zeroized on drop and never printed.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod fs;
pub mod locator;
pub mod memory;
pub mod pinata;
pub mod store;

pub use config::{ConfigError, PinataConfig};
pub use error::BlobError;
pub use fs::FsBlobStore;
pub use locator::GatewayLocator;
pub use memory::MemoryBlobStore;
pub use pinata::PinataBlobStore;
pub use store::{BlobPayload, BlobStore};
