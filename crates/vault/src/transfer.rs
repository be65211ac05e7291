//! Fund transfer seam - how value actually leaves the vault

use async_trait::async_trait;
use cosign_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors reported by a transfer primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Transfer rejected by {primitive}: {reason}")]
    Rejected { primitive: String, reason: String },

    #[error("Balance overflow")]
    Overflow,
}

/// External primitive that moves funds out of the vault
///
/// Called by the execution gate after the transaction has already been marked
/// executed. It must move exactly `value` to `to` or report an error, and must
/// not touch vault state.
#[async_trait]
pub trait FundTransfer: Send + Sync {
    /// Primitive name for logging/debugging
    fn name(&self) -> &str;

    /// Move `value` to `to`, forwarding the transaction payload
    async fn transfer(&self, to: Address, value: Amount, data: &[u8]) -> Result<(), TransferError>;

    /// Funds currently held for the vault
    fn balance(&self) -> Amount;
}

/// Balances held by a `Treasury`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySnapshot {
    /// Funds available to the vault
    pub reserve: Amount,

    /// Total paid out per recipient
    #[serde(default)]
    pub paid_out: BTreeMap<Address, Amount>,
}

/// In-process custody: holds the vault's reserve and settles transfers from it
#[derive(Debug, Default)]
pub struct Treasury {
    state: Mutex<TreasurySnapshot>,
    reject_reason: Option<String>,
}

impl Treasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a treasury holding `reserve`
    pub fn with_reserve(reserve: Amount) -> Self {
        Self::restore(TreasurySnapshot {
            reserve,
            paid_out: BTreeMap::new(),
        })
    }

    /// Rebuild from stored balances
    pub fn restore(snapshot: TreasurySnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            reject_reason: None,
        }
    }

    /// Make every transfer fail with `reason` (failure injection)
    pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
        self.reject_reason = Some(reason.into());
        self
    }

    /// Credit incoming funds, returning the new reserve
    pub fn receive(&self, amount: Amount) -> Result<Amount, TransferError> {
        let mut state = self.lock();
        state.reserve = state
            .reserve
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        Ok(state.reserve)
    }

    /// Total paid out to `recipient`
    pub fn paid_to(&self, recipient: &Address) -> Amount {
        self.lock()
            .paid_out
            .get(recipient)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Copy of the current balances
    pub fn snapshot(&self) -> TreasurySnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, TreasurySnapshot> {
        // Balances are only updated after every check passes, so a poisoned
        // guard still holds consistent data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FundTransfer for Treasury {
    fn name(&self) -> &str {
        "treasury"
    }

    async fn transfer(&self, to: Address, value: Amount, _data: &[u8]) -> Result<(), TransferError> {
        if let Some(reason) = &self.reject_reason {
            return Err(TransferError::Rejected {
                primitive: self.name().to_string(),
                reason: reason.clone(),
            });
        }

        let mut state = self.lock();
        let remaining = state
            .reserve
            .checked_sub(value)
            .ok_or(TransferError::InsufficientFunds {
                requested: value,
                available: state.reserve,
            })?;
        let paid = state
            .paid_out
            .get(&to)
            .copied()
            .unwrap_or(Amount::ZERO)
            .checked_add(value)
            .ok_or(TransferError::Overflow)?;

        state.reserve = remaining;
        state.paid_out.insert(to, paid);
        Ok(())
    }

    fn balance(&self) -> Amount {
        self.lock().reserve
    }
}
