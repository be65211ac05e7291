//! Vault snapshots - serializable image of the full approval state
//!
//! Storage engines are external; this is only the shape they persist. A
//! restored vault is re-validated and audited before it is handed out.

use cosign_core::Address;
use cosign_events::EventSink;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::audit::AuditError;
use crate::confirmation::ConfirmationTracker;
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::ledger::{Transaction, TransactionLedger};
use crate::owners::OwnerRegistry;
use crate::transfer::FundTransfer;
use crate::vault::Vault;

/// Errors restoring a vault from a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid vault setup: {0}")]
    Setup(#[from] VaultError),

    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(#[from] AuditError),
}

/// One transaction and the owners confirming it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    #[serde(default)]
    pub confirmed_by: Vec<Address>,
}

/// Serializable vault state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub name: String,
    pub owners: Vec<Address>,
    pub required_confirmations: usize,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

impl VaultSnapshot {
    /// Empty state for a freshly configured vault
    pub fn empty(config: &VaultConfig) -> Self {
        Self {
            name: config.name.clone(),
            owners: config.owners.clone(),
            required_confirmations: config.required_confirmations,
            transactions: Vec::new(),
        }
    }

    /// Deployment parameters this snapshot was taken under
    pub fn config(&self) -> VaultConfig {
        VaultConfig::new(self.owners.clone(), self.required_confirmations).with_name(&self.name)
    }
}

impl Vault {
    /// Capture the current state
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            name: self.name.clone(),
            owners: self.owners.owners().to_vec(),
            required_confirmations: self.owners.required(),
            transactions: self
                .ledger
                .iter()
                .map(|(tx_index, tx)| TransactionRecord {
                    transaction: tx.clone(),
                    confirmed_by: self.confirmations.confirmers(tx_index),
                })
                .collect(),
        }
    }

    /// Rebuild a vault from a snapshot.
    ///
    /// Runs the construction checks, then audits the restored counters and
    /// confirmation table. No vault is returned unless both pass.
    pub fn restore(
        snapshot: VaultSnapshot,
        transfer: Arc<dyn FundTransfer>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, SnapshotError> {
        let registry = OwnerRegistry::new(snapshot.owners, snapshot.required_confirmations)?;

        let mut tracker = ConfirmationTracker::new();
        let mut transactions = Vec::with_capacity(snapshot.transactions.len());
        for (tx_index, record) in snapshot.transactions.into_iter().enumerate() {
            tracker.restore(tx_index, record.confirmed_by);
            transactions.push(record.transaction);
        }

        let vault = Self::from_parts(
            snapshot.name,
            registry,
            TransactionLedger::from_transactions(transactions),
            tracker,
            transfer,
            events,
        );
        let report = vault.audit()?;

        tracing::info!(
            vault = %vault.name,
            transactions = report.transactions,
            pending = report.pending,
            "Vault restored"
        );
        Ok(vault)
    }
}
