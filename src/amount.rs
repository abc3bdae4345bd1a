use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when building an [`Amount`] from outside input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("'{0}' is not a decimal amount")]
    Malformed(String),

    #[error("amount out of range")]
    Overflow,
}

/// Fixed-point decimal with 2 decimal places, stored as a scaled integer.
///
/// Every value that enters the engine goes through [`Amount::round_half_up`],
/// so sums of amounts are exact to the cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 100;
    const DIGITS: u32 = 2;

    pub const ZERO: Amount = Amount(0);

    /// Largest amount the engine accepts as a principal or a tender.
    ///
    /// Well below `i64::MAX`, so splitting and summing installments of any
    /// accepted amount cannot overflow.
    pub const MAX: Amount = Amount(99_999_999_999_999_999);

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub fn scaled(self) -> i64 {
        self.0
    }

    /// Round `mantissa * 10^-scale` to 2 fractional digits, ties away from zero.
    pub fn round_half_up(mantissa: i128, scale: u32) -> Result<Self, AmountError> {
        let cents = if scale <= Self::DIGITS {
            10i128
                .checked_pow(Self::DIGITS - scale)
                .and_then(|factor| mantissa.checked_mul(factor))
        } else {
            10i128
                .checked_pow(scale - Self::DIGITS)
                .and_then(|divisor| div_half_up(mantissa, divisor))
        }
        .ok_or(AmountError::Overflow)?;

        i64::try_from(cents)
            .map(Amount)
            .map_err(|_| AmountError::Overflow)
    }

    /// Split into `parts` equal shares, rounded to the cent.
    ///
    /// Panics if `parts` is zero.
    pub fn split(self, parts: u32) -> Self {
        assert!(parts > 0, "cannot split an amount into zero parts");
        // |self| / parts always fits back into i64
        let share = div_half_up(i128::from(self.0), i128::from(parts)).unwrap_or_default();
        Amount(share as i64)
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

/// Integer division rounding ties away from zero. `denominator` must be positive.
fn div_half_up(numerator: i128, denominator: i128) -> Option<i128> {
    let doubled = numerator.checked_abs()?.checked_mul(2)?;
    let magnitude = doubled.checked_add(denominator)? / denominator.checked_mul(2)?;
    Some(if numerator < 0 { -magnitude } else { magnitude })
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AmountError::Malformed(s.to_string());

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(malformed());
        }

        let scale = u32::try_from(frac.len()).map_err(|_| AmountError::Overflow)?;
        let mut mantissa: i128 = 0;
        for byte in whole.bytes().chain(frac.bytes()) {
            if !byte.is_ascii_digit() {
                return Err(malformed());
            }
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(byte - b'0')))
                .ok_or(AmountError::Overflow)?;
        }

        Self::round_half_up(if negative { -mantissa } else { mantissa }, scale)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}
