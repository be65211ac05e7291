//! Vault errors
//!
//! Every failure is typed and leaves the vault exactly as it was before the call.

use cosign_core::Address;
use thiserror::Error;

use crate::ledger::TxIndex;
use crate::transfer::TransferError;

/// Errors from vault construction and the approval protocol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    // === Construction ===
    #[error("Owner list cannot be empty")]
    InvalidOwnerCount,

    #[error("Invalid threshold: {required} confirmations required of {owners} owners")]
    InvalidThreshold { required: usize, owners: usize },

    #[error("Invalid owner at position {position}: zero address")]
    InvalidOwner { position: usize },

    #[error("Owner not unique: {0}")]
    OwnerNotUnique(Address),

    // === Authorization ===
    #[error("Not an owner: {0}")]
    NotOwner(Address),

    // === Referential ===
    #[error("Transaction {0} does not exist")]
    TxDoesNotExist(TxIndex),

    // === State conflicts ===
    #[error("Transaction {0} already executed")]
    TxAlreadyExecuted(TxIndex),

    #[error("Transaction {tx_index} already confirmed by {owner}")]
    TxAlreadyConfirmed { tx_index: TxIndex, owner: Address },

    #[error("Transaction {tx_index} not confirmed by {owner}")]
    TxNotConfirmed { tx_index: TxIndex, owner: Address },

    // === Preconditions ===
    #[error("Cannot execute transaction {tx_index}: {confirmations} of {required} confirmations")]
    CannotExecuteTx {
        tx_index: TxIndex,
        confirmations: usize,
        required: usize,
    },

    // === External call ===
    #[error("Transfer for transaction {tx_index} failed: {source}")]
    TransferFailed {
        tx_index: TxIndex,
        #[source]
        source: TransferError,
    },

    #[error("Execution of transaction {0} was interrupted and rolled back")]
    ExecutionInterrupted(TxIndex),
}

impl VaultError {
    /// Whether this error can only come from vault construction
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            VaultError::InvalidOwnerCount
                | VaultError::InvalidThreshold { .. }
                | VaultError::InvalidOwner { .. }
                | VaultError::OwnerNotUnique(_)
        )
    }
}
