//! Ledger base-unit amounts.
//!
//! Every amount the engine moves or trades is an integral number of
//! lamports. Conversion to and from SOL goes through `rust_decimal` so that
//! operator-facing values like `0.005` map to an exact integer.

use crate::{CoreError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Amount in lamports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lamports(pub u64);

impl Lamports {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert a SOL amount to lamports.
    ///
    /// Fails on negative amounts and on amounts with sub-lamport precision.
    pub fn from_sol(sol: Decimal) -> Result<Self> {
        if sol.is_sign_negative() && !sol.is_zero() {
            return Err(CoreError::InvalidConfig(format!(
                "negative SOL amount: {sol}"
            )));
        }
        let lamports = sol
            .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
            .ok_or_else(|| CoreError::InvalidConfig(format!("SOL amount overflows: {sol}")))?;
        if !lamports.fract().is_zero() {
            return Err(CoreError::InvalidConfig(format!(
                "SOL amount finer than one lamport: {sol}"
            )));
        }
        lamports
            .to_u64()
            .map(Self)
            .ok_or_else(|| CoreError::InvalidConfig(format!("SOL amount out of range: {sol}")))
    }

    /// Exact SOL value.
    #[inline]
    pub fn to_sol(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(LAMPORTS_PER_SOL)
    }

    /// Subtraction floored at zero.
    #[inline]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.to_sol().normalize())
    }
}

impl From<u64> for Lamports {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl Add for Lamports {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Lamports {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Lamports {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl Sum for Lamports {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_sol_exact() {
        assert_eq!(Lamports::from_sol(dec!(0.005)).unwrap(), Lamports(5_000_000));
        assert_eq!(Lamports::from_sol(dec!(1)).unwrap(), Lamports(LAMPORTS_PER_SOL));
        assert_eq!(Lamports::from_sol(dec!(0)).unwrap(), Lamports::ZERO);
    }

    #[test]
    fn test_from_sol_rejects_negative_and_sub_lamport() {
        assert!(Lamports::from_sol(dec!(-0.1)).is_err());
        assert!(Lamports::from_sol(dec!(0.0000000001)).is_err());
    }

    #[test]
    fn test_to_sol() {
        assert_eq!(Lamports(25_000_000).to_sol(), dec!(0.025));
        assert_eq!(Lamports(5_000_000).to_string(), "0.005 SOL");
    }

    #[test]
    fn test_arithmetic_saturates() {
        assert_eq!(Lamports(5) - Lamports(10), Lamports::ZERO);
        assert_eq!(Lamports(u64::MAX) + Lamports(1), Lamports(u64::MAX));
        let total: Lamports = [Lamports(1), Lamports(2), Lamports(3)].into_iter().sum();
        assert_eq!(total, Lamports(6));
    }
}
