//! Cosign Core - Domain types
//!
//! This crate contains the fundamental types used across Cosign:
//! - `Address`: 20-byte identifier for owners, depositors and recipients
//! - `Amount`: Non-negative whole-unit amount in the ledger's native unit

pub mod address;
pub mod amount;
pub mod serde_hex;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use amount::{Amount, AmountError};
