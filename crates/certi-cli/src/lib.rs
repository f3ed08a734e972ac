//! # certi-cli — CertiChain Command-Line Interface
//!
//! A thin clap surface over [`certi_workflow::CredentialWorkflows`].
//!
//! ## Subcommands
//!
//! - `genesis`: create a local registry
//! - `role`: resolve an identity's role
//! - `upload`: store a file and register it
//! - `documents`: list the caller's documents
//! - `candidates`: list a subject's unverified documents
//! - `verify`: attest a subject's document
//! - `lookup`: public view of a subject's documents
//! - `add-issuer`: register an issuer
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to the workflow crate; no registry rules live here.

#![deny(unsafe_code)]

pub mod backend;
pub mod commands;
pub mod config;
