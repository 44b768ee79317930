//! Token amounts
//!
//! Amounts are u64 values in the token's smallest unit (9 decimals). All
//! arithmetic that could wrap goes through checked operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of the marketplace token
pub const TOKEN_DECIMALS: u32 = 9;

const ONE_TOKEN: u64 = 1_000_000_000;

/// A token amount in smallest units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Amount(pub u64);

impl Amount {
    /// Create an amount from smallest units
    pub fn new(units: u64) -> Self {
        Self(units)
    }

    /// Create an amount from whole tokens
    pub fn tokens(whole: u64) -> Self {
        Self(whole.saturating_mul(ONE_TOKEN))
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(0)
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Integer percentage of this amount (floor)
    ///
    /// Widens to u128 internally, so it cannot overflow for any u64 value.
    pub fn percentage(self, percent: u8) -> Self {
        Self((self.0 as u128 * percent as u128 / 100) as u64)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / ONE_TOKEN, self.0 % ONE_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_constructor() {
        assert_eq!(Amount::tokens(100), Amount::new(100_000_000_000));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(100);
        let b = Amount::new(40);
        assert_eq!(a.checked_add(b), Some(Amount::new(140)));
        assert_eq!(a.checked_sub(b), Some(Amount::new(60)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::new(u64::MAX).checked_add(Amount::new(1)), None);
    }

    #[test]
    fn test_percentage_floors() {
        assert_eq!(Amount::new(100).percentage(95), Amount::new(95));
        assert_eq!(Amount::new(99).percentage(95), Amount::new(94));
        assert_eq!(Amount::new(1).percentage(95), Amount::new(0));
        // No overflow at the top of the u64 range
        assert_eq!(
            Amount::new(u64::MAX).percentage(100),
            Amount::new(u64::MAX)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::tokens(100).to_string(), "100.000000000");
        assert_eq!(Amount::new(1_500_000_000).to_string(), "1.500000000");
    }
}
