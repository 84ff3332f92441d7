use std::fmt;

use thiserror::Error;

/// Decimal places a currency may declare for amount conversion.
pub const MAX_DECIMALS: u8 = 4;

/// Digits the amount field may carry on the wire.
pub const MAX_AMOUNT_DIGITS: u32 = 12;

/// Errors raised when a decimal amount cannot be expressed in minor units.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    #[error("{decimals} decimal places, the protocol allows at most {MAX_DECIMALS}")]
    InvalidDecimals { decimals: u8 },

    #[error("amount needs {digits} digits, the amount field carries at most {MAX_AMOUNT_DIGITS}")]
    TooLarge { digits: u32 },
}

/// An amount in minor currency units, as carried by the `CB` field.
///
/// `112.45` EUR with 2 decimal places is `MinorUnits(11245)` and renders
/// as `"11245"`. Conversion drops the sign: the protocol has no negative
/// amounts, refunds travel under their own action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct MinorUnits(u64);

impl MinorUnits {
    /// Convert a decimal amount using the currency's declared decimal places.
    ///
    /// Halves round away from zero, matching what a till displays.
    pub fn from_decimal(value: f64, decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::InvalidDecimals { decimals });
        }
        let scale = 10u64.pow(u32::from(decimals)) as f64;
        // The float-to-int cast saturates, absurd inputs land in TooLarge.
        let units = (value.abs() * scale).round() as u64;
        let digits = digit_count(units);
        if digits > MAX_AMOUNT_DIGITS {
            return Err(AmountError::TooLarge { digits });
        }
        Ok(MinorUnits(units))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

fn digit_count(units: u64) -> u32 {
    if units == 0 { 1 } else { units.ilog10() + 1 }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The wire field is never shorter than two digits.
        write!(f, "{:02}", self.0)
    }
}
