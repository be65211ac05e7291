//! Transaction ledger - append-only log of proposed transfers

use cosign_core::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// Position of a transaction in the ledger. Never reused or reordered.
pub type TxIndex = usize;

/// A proposed outbound transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Recipient (not checked against the owner set)
    pub to: Address,

    /// Amount to send, in native units
    pub value: Amount,

    /// Opaque payload handed to the transfer primitive unchanged
    #[serde(with = "cosign_core::serde_hex", default)]
    pub data: Vec<u8>,

    /// Set exactly once, by a successful execution
    pub executed: bool,

    /// Number of owners currently confirming this transaction
    pub num_confirmations: usize,
}

impl Transaction {
    fn new(to: Address, value: Amount, data: Vec<u8>) -> Self {
        Self {
            to,
            value,
            data,
            executed: false,
            num_confirmations: 0,
        }
    }

    /// Whether `required` confirmations have been collected
    pub fn has_enough_confirmations(&self, required: usize) -> bool {
        self.num_confirmations >= required
    }

    /// Confirmations still missing before execution is allowed
    pub fn confirmations_remaining(&self, required: usize) -> usize {
        required.saturating_sub(self.num_confirmations)
    }
}

/// Append-only list of transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored transactions, keeping their order
    pub(crate) fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Append a new pending transaction and return its index
    pub fn append(&mut self, to: Address, value: Amount, data: Vec<u8>) -> TxIndex {
        let index = self.transactions.len();
        self.transactions.push(Transaction::new(to, value, data));
        index
    }

    /// Number of transactions ever submitted
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    pub fn get(&self, index: TxIndex) -> Result<&Transaction, VaultError> {
        self.transactions
            .get(index)
            .ok_or(VaultError::TxDoesNotExist(index))
    }

    pub(crate) fn get_mut(&mut self, index: TxIndex) -> Result<&mut Transaction, VaultError> {
        self.transactions
            .get_mut(index)
            .ok_or(VaultError::TxDoesNotExist(index))
    }

    /// All transactions with their indices, in submission order
    pub fn iter(&self) -> impl Iterator<Item = (TxIndex, &Transaction)> {
        self.transactions.iter().enumerate()
    }
}
