//! Vault audit events

use chrono::{DateTime, Utc};
use cosign_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Events emitted by a vault
///
/// These are append-only audit records. Nothing inside the vault reads them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// Funds were credited to the vault
    Deposit {
        sender: Address,
        amount: Amount,
        /// Treasury balance after the credit
        balance: Amount,
        timestamp: DateTime<Utc>,
    },

    /// An owner proposed a transfer
    SubmitTransaction {
        owner: Address,
        tx_index: usize,
        to: Address,
        value: Amount,
        #[serde(with = "cosign_core::serde_hex")]
        data: Vec<u8>,
        timestamp: DateTime<Utc>,
    },

    /// An owner approved a pending transfer
    ConfirmTransaction {
        owner: Address,
        tx_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// An owner withdrew an earlier approval
    RevokeConfirmation {
        owner: Address,
        tx_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// A transfer was executed and funds left the vault
    ExecuteTransaction {
        owner: Address,
        tx_index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Event kind, used for filtering the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Deposit,
    Submit,
    Confirm,
    Revoke,
    Execute,
}

impl VaultEvent {
    /// Create a Deposit event
    pub fn deposit(sender: Address, amount: Amount, balance: Amount) -> Self {
        Self::Deposit {
            sender,
            amount,
            balance,
            timestamp: Utc::now(),
        }
    }

    /// Create a SubmitTransaction event
    pub fn submitted(
        owner: Address,
        tx_index: usize,
        to: Address,
        value: Amount,
        data: Vec<u8>,
    ) -> Self {
        Self::SubmitTransaction {
            owner,
            tx_index,
            to,
            value,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Create a ConfirmTransaction event
    pub fn confirmed(owner: Address, tx_index: usize) -> Self {
        Self::ConfirmTransaction {
            owner,
            tx_index,
            timestamp: Utc::now(),
        }
    }

    /// Create a RevokeConfirmation event
    pub fn revoked(owner: Address, tx_index: usize) -> Self {
        Self::RevokeConfirmation {
            owner,
            tx_index,
            timestamp: Utc::now(),
        }
    }

    /// Create an ExecuteTransaction event
    pub fn executed(owner: Address, tx_index: usize) -> Self {
        Self::ExecuteTransaction {
            owner,
            tx_index,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Deposit { .. } => EventKind::Deposit,
            Self::SubmitTransaction { .. } => EventKind::Submit,
            Self::ConfirmTransaction { .. } => EventKind::Confirm,
            Self::RevokeConfirmation { .. } => EventKind::Revoke,
            Self::ExecuteTransaction { .. } => EventKind::Execute,
        }
    }

    /// Transaction the event refers to (None for deposits)
    pub fn tx_index(&self) -> Option<usize> {
        match self {
            Self::Deposit { .. } => None,
            Self::SubmitTransaction { tx_index, .. }
            | Self::ConfirmTransaction { tx_index, .. }
            | Self::RevokeConfirmation { tx_index, .. }
            | Self::ExecuteTransaction { tx_index, .. } => Some(*tx_index),
        }
    }

    /// Address that caused the event
    pub fn actor(&self) -> Address {
        match self {
            Self::Deposit { sender, .. } => *sender,
            Self::SubmitTransaction { owner, .. }
            | Self::ConfirmTransaction { owner, .. }
            | Self::RevokeConfirmation { owner, .. }
            | Self::ExecuteTransaction { owner, .. } => *owner,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Deposit { timestamp, .. }
            | Self::SubmitTransaction { timestamp, .. }
            | Self::ConfirmTransaction { timestamp, .. }
            | Self::RevokeConfirmation { timestamp, .. }
            | Self::ExecuteTransaction { timestamp, .. } => *timestamp,
        }
    }
}
