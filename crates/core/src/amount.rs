//! Native-unit amounts
//!
//! Vault values are whole, non-negative counts of the ledger's native unit.
//! `Amount` can only be built through checks that hold both properties.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Amount must be a whole number of native units: {0}")]
    Fractional(Decimal),
}

/// Whole, non-negative quantity of native units.
///
/// ```
/// use cosign_core::Amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(Amount::new(Decimal::new(500, 2)).unwrap(), Amount::from_units(5));
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// assert!(Amount::new(Decimal::new(25, 1)).is_err());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate a decimal quantity. Trailing zero scale (`5.00`) is accepted and dropped.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        if !value.fract().is_zero() {
            return Err(AmountError::Fractional(value));
        }
        Ok(Self(value.normalize()))
    }

    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// `None` when the sum leaves the decimal range
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` when `rhs` is larger than `self`
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        if rhs > self {
            return None;
        }
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_units_accepted() {
        assert_eq!(Amount::new(dec!(40)).unwrap(), Amount::from_units(40));
        assert_eq!(Amount::new(dec!(40)).unwrap().as_decimal(), dec!(40));
        assert!(Amount::new(dec!(0)).unwrap().is_zero());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            Amount::new(dec!(-3)),
            Err(AmountError::Negative(dec!(-3)))
        );
        assert_eq!(
            Amount::new(dec!(0.5)),
            Err(AmountError::Fractional(dec!(0.5)))
        );
    }

    #[test]
    fn test_scale_is_normalized() {
        let amount = Amount::new(dec!(7.000)).unwrap();
        assert_eq!(amount.to_string(), "7");
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"7\"");
    }

    #[test]
    fn test_reserve_arithmetic() {
        let reserve = Amount::from_units(10);
        let spend = Amount::from_units(4);

        assert_eq!(reserve.checked_sub(spend), Some(Amount::from_units(6)));
        assert_eq!(spend.checked_sub(reserve), None);
        assert_eq!(reserve.checked_sub(reserve), Some(Amount::ZERO));
        assert_eq!(reserve.checked_add(spend), Some(Amount::from_units(14)));
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Amount>("\"2.5\"").is_err());
        assert!(serde_json::from_str::<Amount>("\"-2\"").is_err());
        assert_eq!(
            serde_json::from_str::<Amount>("\"2\"").unwrap(),
            Amount::from_units(2)
        );
    }
}
