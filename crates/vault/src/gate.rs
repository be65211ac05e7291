//! Execution gate - the only path by which funds leave the vault
//!
//! ```text
//! execute(caller, tx)
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ owner? exists?      │──► NotOwner / TxDoesNotExist
//! │ not executed?       │──► TxAlreadyExecuted
//! │ threshold met?      │──► CannotExecuteTx
//! └──────────┬──────────┘
//!            ▼
//! ┌─────────────────────┐
//! │ executed = true     │   effects first
//! └──────────┬──────────┘
//!            ▼
//! ┌─────────────────────┐
//! │ FundTransfer        │──► Err: executed = false, TransferFailed
//! └──────────┬──────────┘
//!            ▼
//!   ExecuteTransaction event
//! ```
//!
//! The vault stays mutably borrowed while the transfer is awaited, so no other
//! operation on the same vault can run until the gate has closed again. An
//! abandoned transfer counts as a failed one.

use cosign_core::{Address, Amount};
use cosign_events::VaultEvent;
use std::sync::Arc;

use crate::error::VaultError;
use crate::ledger::{TransactionLedger, TxIndex};
use crate::vault::{log_rejection, Vault};

/// What the gate hands to the transfer primitive once it has opened
struct Release {
    to: Address,
    value: Amount,
    data: Vec<u8>,
}

/// Armed while a transfer is in flight. Dropped armed (the `execute` future
/// was abandoned mid-transfer) it resets the executed flag, the same outcome
/// as a failed transfer.
struct InFlight<'a> {
    ledger: &'a mut TransactionLedger,
    vault: &'a str,
    tx_index: TxIndex,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(ledger: &'a mut TransactionLedger, vault: &'a str, tx_index: TxIndex) -> Self {
        Self {
            ledger,
            vault,
            tx_index,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(tx) = self.ledger.get_mut(self.tx_index) {
            tx.executed = false;
        }
        tracing::warn!(
            vault = %self.vault,
            tx_index = self.tx_index,
            "Execution abandoned during transfer, rolled back"
        );
    }
}

impl Vault {
    /// Execute a transaction that has collected enough confirmations.
    ///
    /// On transfer failure the executed flag is rolled back, no event is
    /// emitted, and the transaction can be executed again later. Dropping
    /// this future mid-transfer rolls back the same way; `SharedVault`
    /// runs it on its own task so callers cannot drop it.
    pub async fn execute(&mut self, caller: Address, tx_index: TxIndex) -> Result<(), VaultError> {
        let release = match self.open_gate(caller, tx_index) {
            Ok(release) => release,
            Err(e) => {
                log_rejection(&self.name, "execute", &caller, &e);
                return Err(e);
            }
        };

        let transfer = Arc::clone(&self.transfer);
        let in_flight = InFlight::new(&mut self.ledger, &self.name, tx_index);
        let outcome = transfer
            .transfer(release.to, release.value, &release.data)
            .await;
        in_flight.disarm();

        match outcome {
            Ok(()) => {
                tracing::info!(
                    vault = %self.name,
                    owner = %caller,
                    tx_index,
                    to = %release.to,
                    value = %release.value,
                    "Transaction executed"
                );
                self.publish(VaultEvent::executed(caller, tx_index));
                Ok(())
            }
            Err(source) => {
                self.roll_back(tx_index);
                tracing::warn!(
                    vault = %self.name,
                    owner = %caller,
                    tx_index,
                    primitive = transfer.name(),
                    error = %source,
                    "Transfer failed, execution rolled back"
                );
                Err(VaultError::TransferFailed { tx_index, source })
            }
        }
    }

    /// Check every precondition, then mark the transaction executed.
    fn open_gate(&mut self, caller: Address, tx_index: TxIndex) -> Result<Release, VaultError> {
        self.owners.authorize(&caller)?;
        let required = self.owners.required();
        let tx = self.ledger.get_mut(tx_index)?;

        if tx.executed {
            return Err(VaultError::TxAlreadyExecuted(tx_index));
        }
        if !tx.has_enough_confirmations(required) {
            return Err(VaultError::CannotExecuteTx {
                tx_index,
                confirmations: tx.num_confirmations,
                required,
            });
        }

        tx.executed = true;
        Ok(Release {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
        })
    }

    fn roll_back(&mut self, tx_index: TxIndex) {
        if let Ok(tx) = self.ledger.get_mut(tx_index) {
            tx.executed = false;
        }
    }
}
