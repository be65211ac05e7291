//! Cosign CLI - operator surface for a single vault
//!
//! This crate provides the `cosign` binary and its command implementations.

pub mod commands;
pub mod context;

pub use context::{AppContext, StoredState};
