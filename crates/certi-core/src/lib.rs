//! # certi-core — Foundational Types for CertiChain
//!
//! Defines the type-system primitives shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated identity newtype.** `Identity` can only be built from a
//!    well-formed account address. No bare strings for participants.
//!
//! 2. **Roles are derived, never stored.** `Role` is computed from the
//!    registry's owner and issuer set at query time via `Role::classify`.
//!
//! 3. **One authorization function.** `Role::permits(Action)` is the single
//!    pure decision point. Client-side checks built on it are advisory; the
//!    ledger enforces the same table independently.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `certi-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod document;
pub mod error;
pub mod identity;
pub mod role;

pub use document::{ContentRef, Document, DocumentLabel};
pub use error::{AccessDenied, IdentityError, ValidationError};
pub use identity::Identity;
pub use role::{authorize, Action, Role};
