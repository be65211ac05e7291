//! # Cosign Vault
//!
//! Shared-custody vault: a fixed set of owners, an M-of-N threshold, and a
//! gated path for moving funds out.
//!
//! ```text
//! submit ──► Transaction #n (pending, 0 confirmations)
//!                 │
//!       confirm / revoke (owners, one bit each)
//!                 │
//!                 ▼
//!        confirmations >= M ?
//!                 │ yes
//!                 ▼
//!   execute ──► executed = true ──► FundTransfer ──► ExecuteTransaction
//! ```
//!
//! ## Features
//! - Owner set and threshold fixed at construction
//! - Per-owner confirmation bits with an incrementally kept counter
//! - Effects-before-transfer execution, rolled back on transfer failure
//! - Audit records through a pluggable [`cosign_events::EventSink`]
//! - Snapshots with consistency audit on restore

mod audit;
mod config;
mod confirmation;
mod error;
mod gate;
mod ledger;
mod owners;
mod shared;
mod snapshot;
mod transfer;
mod vault;

pub use audit::{AuditError, AuditReport};
pub use config::{ConfigError, VaultConfig};
pub use confirmation::ConfirmationTracker;
pub use error::VaultError;
pub use ledger::{Transaction, TransactionLedger, TxIndex};
pub use owners::OwnerRegistry;
pub use shared::SharedVault;
pub use snapshot::{SnapshotError, TransactionRecord, VaultSnapshot};
pub use transfer::{FundTransfer, TransferError, Treasury, TreasurySnapshot};
pub use vault::Vault;
