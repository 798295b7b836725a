use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

mod wide {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit intermediate for wad products
        pub struct U256(4);
    }
}
pub use wide::U256;

/// 10^18
pub const WAD: u128 = 1_000_000_000_000_000_000;
pub const BPS_SCALER: u128 = 10_000;
pub const PERCENT_SCALER: u128 = 100;

/// Unsigned fixed-point decimal scaled by [`WAD`], same width as the on-chain `Decimal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Decimal(u128);

impl Decimal {
    pub const ZERO: Decimal = Decimal(0);
    pub const ONE: Decimal = Decimal(WAD);

    pub const fn from_wads(wads: u128) -> Self {
        Decimal(wads)
    }

    pub const fn to_wads(self) -> u128 {
        self.0
    }

    pub fn from_integer(value: u64) -> Self {
        // u64::MAX * 10^18 < u128::MAX
        Decimal(value as u128 * WAD)
    }

    pub fn from_percent(percent: u8) -> Self {
        Decimal(percent as u128 * WAD / PERCENT_SCALER)
    }

    pub fn from_bps(bps: u16) -> Self {
        Decimal(bps as u128 * WAD / BPS_SCALER)
    }

    /// 10^exponent as a decimal, used to strip token decimals.
    pub fn ten_pow(exponent: u8) -> Result<Self> {
        let scale = 10u128
            .checked_pow(exponent as u32)
            .ok_or(Error::MathOverflow("10^decimals"))?;
        scale
            .checked_mul(WAD)
            .map(Decimal)
            .ok_or(Error::MathOverflow("10^decimals"))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn try_add(self, rhs: Decimal) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Decimal)
            .ok_or(Error::MathOverflow("decimal add"))
    }

    pub fn try_sub(self, rhs: Decimal) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Decimal)
            .ok_or(Error::MathOverflow("decimal sub"))
    }

    pub fn try_mul(self, rhs: Decimal) -> Result<Self> {
        let product = U256::from(self.0) * U256::from(rhs.0) / U256::from(WAD);
        narrow(product, "decimal mul").map(Decimal)
    }

    pub fn try_mul_u64(self, rhs: u64) -> Result<Self> {
        self.0
            .checked_mul(rhs as u128)
            .map(Decimal)
            .ok_or(Error::MathOverflow("decimal mul"))
    }

    pub fn try_div(self, rhs: Decimal) -> Result<Self> {
        if rhs.0 == 0 {
            return Err(Error::MathOverflow("decimal division by zero"));
        }
        let quotient = U256::from(self.0) * U256::from(WAD) / U256::from(rhs.0);
        narrow(quotient, "decimal div").map(Decimal)
    }

    /// self * mul / div with a single rounding step.
    pub fn try_mul_div(self, mul: Decimal, div: Decimal) -> Result<Self> {
        if div.0 == 0 {
            return Err(Error::MathOverflow("decimal division by zero"));
        }
        let product = U256::from(self.0)
            .checked_mul(U256::from(mul.0))
            .ok_or(Error::MathOverflow("decimal mul"))?;
        narrow(product / U256::from(div.0), "decimal mul_div").map(Decimal)
    }

    pub fn try_div_u64(self, rhs: u64) -> Result<Self> {
        if rhs == 0 {
            return Err(Error::MathOverflow("decimal division by zero"));
        }
        Ok(Decimal(self.0 / rhs as u128))
    }

    /// Integer part, rounding toward zero.
    pub fn try_floor_u64(self) -> Result<u64> {
        u64::try_from(self.0 / WAD).map_err(|_| Error::MathOverflow("decimal to u64"))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / WAD as f64
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / WAD;
        let frac = self.0 % WAD;
        write!(f, "{}.{:018}", int, frac)
    }
}

fn narrow(value: U256, what: &'static str) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(Error::MathOverflow(what));
    }
    Ok(value.as_u128())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display() {
        assert_eq!(Decimal::from_integer(3).to_string(), "3.000000000000000000");
        assert_eq!(Decimal::from_percent(5).to_string(), "0.050000000000000000");
    }

    #[test]
    fn test_mul_does_not_overflow_before_division() {
        // u64::MAX * u64::MAX overflows u128 once both are scaled by WAD
        let a = Decimal::from_integer(u64::MAX);
        let b = Decimal::from_integer(2);
        let product = a.try_mul(b).unwrap();
        assert_eq!(product.to_wads(), u64::MAX as u128 * 2 * WAD);
    }

    #[test]
    fn test_div_by_zero() {
        assert!(matches!(
            Decimal::ONE.try_div(Decimal::ZERO),
            Err(Error::MathOverflow(_))
        ));
    }

    #[test]
    fn test_ten_pow() {
        assert_eq!(Decimal::ten_pow(0).unwrap(), Decimal::ONE);
        assert_eq!(Decimal::ten_pow(6).unwrap(), Decimal::from_integer(1_000_000));
        assert!(Decimal::ten_pow(40).is_err());
    }

    proptest! {
        #[test]
        fn wad_scale_recovers_within_one_unit(wads in 0u128..(u64::MAX as u128 * WAD)) {
            let d = Decimal::from_wads(wads);
            let back = d.try_floor_u64().unwrap() as u128 * WAD;
            prop_assert!(back <= wads);
            prop_assert!(wads - back < WAD);
        }

        #[test]
        fn mul_then_div_is_stable(a in 0u64..1_000_000_000_000u64, b in 1u64..1_000_000u64) {
            let x = Decimal::from_integer(a);
            let y = Decimal::from_integer(b);
            let back = x.try_mul(y).unwrap().try_div(y).unwrap();
            prop_assert_eq!(back, x);
        }
    }
}
