//! Signed fixed-point arithmetic at 27 decimals.
//!
//! Every margin formula runs on [`FixedPoint`]. Token amounts and prices enter
//! through [`FixedPoint::from_scaled_uint`] and leave through
//! [`FixedPoint::to_scaled_uint`], which is the only place rounding direction
//! is chosen. Multiplication and division widen to 256 bits so the
//! intermediate product never wraps, then truncate toward zero.

use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FP_DECIMALS: u32 = 27;

const SCALE: i128 = 1_000_000_000_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("fixed point overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot convert negative value {0} to an unsigned amount")]
    Negative(FixedPoint),

    #[error("unsupported decimals: {0}")]
    UnsupportedDecimals(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FixedPoint(i128);

impl FixedPoint {
    pub const ZERO: FixedPoint = FixedPoint(0);
    pub const ONE: FixedPoint = FixedPoint(SCALE);

    pub fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i128 {
        self.0
    }

    pub fn from_unscaled_int(value: i32) -> Self {
        // |i32| * 1e27 stays below i128::MAX
        Self(value as i128 * SCALE)
    }

    /// Lift an unsigned integer carrying `decimals` decimals into 27-decimal
    /// space. Values too large for the signed range are rejected.
    pub fn from_scaled_uint(value: u128, decimals: u32) -> Result<Self, MathError> {
        let raw = if decimals <= FP_DECIMALS {
            let factor = pow10(FP_DECIMALS - decimals)? as u128;
            value.checked_mul(factor).ok_or(MathError::Overflow)?
        } else {
            let divisor = pow10(decimals - FP_DECIMALS)? as u128;
            value / divisor
        };
        i128::try_from(raw).map(Self).map_err(|_| MathError::Overflow)
    }

    /// Project back down to `decimals`. `round_down` floors, otherwise any
    /// dropped remainder bumps the result up by one unit.
    pub fn to_scaled_uint(&self, decimals: u32, round_down: bool) -> Result<u128, MathError> {
        if self.0 < 0 {
            return Err(MathError::Negative(*self));
        }
        let value = self.0 as u128;
        if decimals <= FP_DECIMALS {
            let divisor = pow10(FP_DECIMALS - decimals)? as u128;
            let quotient = value / divisor;
            if !round_down && value % divisor != 0 {
                return quotient.checked_add(1).ok_or(MathError::Overflow);
            }
            Ok(quotient)
        } else {
            let factor = pow10(decimals - FP_DECIMALS)? as u128;
            value.checked_mul(factor).ok_or(MathError::Overflow)
        }
    }

    pub fn checked_add(&self, other: FixedPoint) -> Result<Self, MathError> {
        self.0.checked_add(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(&self, other: FixedPoint) -> Result<Self, MathError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MathError::Overflow)
    }

    // a * b / 1e27, truncated toward zero
    pub fn checked_mul(&self, other: FixedPoint) -> Result<Self, MathError> {
        let product = U256::from(self.0.unsigned_abs()) * U256::from(other.0.unsigned_abs());
        let magnitude = product / U256::from(SCALE as u128);
        Self::with_sign(magnitude, (self.0 < 0) != (other.0 < 0))
    }

    // a * 1e27 / b, truncated toward zero
    pub fn checked_div(&self, other: FixedPoint) -> Result<Self, MathError> {
        if other.0 == 0 {
            return Err(MathError::DivisionByZero);
        }
        let numerator = U256::from(self.0.unsigned_abs()) * U256::from(SCALE as u128);
        let magnitude = numerator / U256::from(other.0.unsigned_abs());
        Self::with_sign(magnitude, (self.0 < 0) != (other.0 < 0))
    }

    pub fn abs(&self) -> Result<Self, MathError> {
        self.0.checked_abs().map(Self).ok_or(MathError::Overflow)
    }

    pub fn min(self, other: FixedPoint) -> Self {
        std::cmp::min(self, other)
    }

    pub fn max(self, other: FixedPoint) -> Self {
        std::cmp::max(self, other)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Decimal view for display. Digits that do not fit the 96-bit mantissa
    /// are truncated from the right.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let mut raw = self.0;
        let mut scale = FP_DECIMALS;
        loop {
            if let Ok(d) = Decimal::try_from_i128_with_scale(raw, scale) {
                return Some(d.normalize());
            }
            if scale == 0 {
                return None;
            }
            raw /= 10;
            scale -= 1;
        }
    }

    fn with_sign(magnitude: U256, negative: bool) -> Result<Self, MathError> {
        if magnitude > U256::from(i128::MAX as u128) {
            return Err(MathError::Overflow);
        }
        let value = magnitude.low_u128() as i128;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{}", d),
            None => write!(f, "{}e-{}", self.0, FP_DECIMALS),
        }
    }
}

fn pow10(exp: u32) -> Result<i128, MathError> {
    10i128.checked_pow(exp).ok_or(MathError::UnsupportedDecimals(exp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fp(units: i32) -> FixedPoint {
        FixedPoint::from_unscaled_int(units)
    }

    #[test]
    fn scaling_in_and_out() {
        let x = FixedPoint::from_scaled_uint(250_00000000, 8).unwrap();
        assert_eq!(x, fp(250));
        assert_eq!(x.to_scaled_uint(8, true).unwrap(), 250_00000000);
        assert_eq!(x.to_scaled_uint(6, true).unwrap(), 250_000000);
    }

    #[test]
    fn rounding_direction() {
        // 2/3 in 27 decimals, then back to 8
        let two_thirds = fp(2).checked_div(fp(3)).unwrap();
        assert_eq!(two_thirds.to_scaled_uint(8, true).unwrap(), 66_666_666);
        assert_eq!(two_thirds.to_scaled_uint(8, false).unwrap(), 66_666_667);

        // exact values never get bumped
        assert_eq!(fp(1).to_scaled_uint(8, false).unwrap(), 100_000_000);
    }

    #[test]
    fn dust_rounds_up_to_one_unit() {
        let dust = FixedPoint::from_raw(1);
        assert_eq!(dust.to_scaled_uint(8, false).unwrap(), 1);
        assert_eq!(dust.to_scaled_uint(8, true).unwrap(), 0);
    }

    #[test]
    fn negative_values_cannot_leave() {
        let neg = fp(-1);
        assert!(matches!(neg.to_scaled_uint(8, true), Err(MathError::Negative(_))));
    }

    #[test]
    fn mul_div_truncate_toward_zero() {
        let third = fp(1).checked_div(fp(3)).unwrap();
        let neg_third = fp(-1).checked_div(fp(3)).unwrap();
        assert_eq!(neg_third.raw(), -third.raw());
        assert_eq!(fp(-4).checked_mul(fp(3)).unwrap(), fp(-12));
    }

    #[test]
    fn wide_intermediate_product() {
        // raw operands multiply past i128 before the rescale
        let a = fp(100_000);
        let b = fp(1_000_000);
        let expected = FixedPoint::from_scaled_uint(100_000_000_000, 0).unwrap();
        assert_eq!(a.checked_mul(b).unwrap(), expected);
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(FixedPoint::from_scaled_uint(u128::MAX, 8), Err(MathError::Overflow));
        let huge = FixedPoint::from_raw(i128::MAX);
        assert_eq!(huge.checked_add(FixedPoint::ONE), Err(MathError::Overflow));
        assert_eq!(huge.checked_mul(fp(2)), Err(MathError::Overflow));
        assert_eq!(FixedPoint::from_raw(i128::MIN).abs(), Err(MathError::Overflow));
    }

    #[test]
    fn divide_by_zero() {
        assert_eq!(fp(1).checked_div(FixedPoint::ZERO), Err(MathError::DivisionByZero));
    }

    #[test]
    fn ordering_and_extrema() {
        assert!(fp(-1) < FixedPoint::ZERO);
        assert_eq!(fp(3).min(fp(-2)), fp(-2));
        assert_eq!(fp(3).max(fp(-2)), fp(3));
        assert_eq!(fp(-7).abs().unwrap(), fp(7));
    }

    #[test]
    fn decimal_view() {
        let x = fp(1).checked_div(fp(4)).unwrap();
        assert_eq!(x.to_decimal(), Some(dec!(0.25)));
        assert_eq!(x.to_string(), "0.25");
        assert_eq!(fp(250).to_decimal(), Some(dec!(250)));
    }
}
