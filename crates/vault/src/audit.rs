//! Consistency audit - recomputes confirmation counters from the table
//!
//! Counters are maintained incrementally by confirm/revoke and never derived
//! on the hot path. This check rebuilds them the slow way and compares.

use cosign_core::Address;
use thiserror::Error;

use crate::ledger::TxIndex;
use crate::vault::Vault;

/// A disagreement between counters and the confirmation table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("Transaction {tx_index}: counter is {counter}, confirmation table has {actual}")]
    CountDrift {
        tx_index: TxIndex,
        counter: usize,
        actual: usize,
    },

    #[error("Transaction {tx_index} is confirmed by non-owner {address}")]
    ForeignConfirmation { tx_index: TxIndex, address: Address },

    #[error("Confirmations recorded for unknown transaction {0}")]
    UnknownTransaction(TxIndex),
}

/// Summary of a clean audit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub transactions: usize,
    pub executed: usize,
    pub pending: usize,
    /// Confirmations across all transactions
    pub confirmations: usize,
}

impl Vault {
    /// Verify that every counter matches the confirmation table and that only
    /// owners appear in it.
    pub fn audit(&self) -> Result<AuditReport, AuditError> {
        let table = self.confirmations.table();

        for tx_index in table.keys() {
            if *tx_index >= self.ledger.count() {
                return Err(AuditError::UnknownTransaction(*tx_index));
            }
        }

        let mut report = AuditReport::default();
        for (tx_index, tx) in self.ledger.iter() {
            let confirmers = table.get(&tx_index);

            if let Some(address) = confirmers
                .into_iter()
                .flatten()
                .find(|address| !self.owners.is_owner(address))
            {
                return Err(AuditError::ForeignConfirmation {
                    tx_index,
                    address: *address,
                });
            }

            let actual = confirmers.map_or(0, |owners| owners.len());
            if actual != tx.num_confirmations {
                return Err(AuditError::CountDrift {
                    tx_index,
                    counter: tx.num_confirmations,
                    actual,
                });
            }

            report.transactions += 1;
            report.confirmations += actual;
            if tx.executed {
                report.executed += 1;
            } else {
                report.pending += 1;
            }
        }

        tracing::debug!(
            vault = %self.name,
            transactions = report.transactions,
            confirmations = report.confirmations,
            "Audit passed"
        );
        Ok(report)
    }
}
