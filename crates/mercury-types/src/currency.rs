use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Quantity large enough to stand in for "unlimited" without overflowing
/// when added to.
pub const BASICALLY_INFINITE: u64 = u64::MAX / 2;

const MICROS_PER_UNIT: u64 = 1_000_000;
const UNIT_DECIMALS: usize = 6;

/// An amount of the economy's currency, counted in micro-units.
///
/// Serialized as the bare micro-unit integer. Arithmetic is always checked;
/// callers decide what an overflow or underflow means.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Currency(u64);

impl Currency {
    pub const ZERO: Self = Self(0);
    pub const MICRO: Self = Self(1);
    pub const MILLI: Self = Self(1_000);
    pub const UNIT: Self = Self(MICROS_PER_UNIT);
    /// Amount granted by one stipend.
    pub const STIPEND: Self = Self(10 * MICROS_PER_UNIT);
    pub const BASICALLY_INFINITE: Self = Self(BASICALLY_INFINITE);

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Whole units. Panics on overflow in every build profile, so only use
    /// with literal amounts.
    pub const fn units(units: u64) -> Self {
        match units.checked_mul(MICROS_PER_UNIT) {
            Some(micros) => Self(micros),
            None => panic!("currency amount overflows u64 micro-units"),
        }
    }

    pub const fn micros(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl From<u64> for Currency {
    fn from(micros: u64) -> Self {
        Self(micros)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06} unit",
            self.0 / MICROS_PER_UNIT,
            self.0 % MICROS_PER_UNIT
        )
    }
}

/// Parses a decimal amount of whole units, e.g. `"25"`, `"0.5"` or
/// `"12.000001 unit"`. At most six fractional digits are accepted.
impl FromStr for Currency {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix("unit").unwrap_or(trimmed).trim_end();
        let invalid = || TypeError::InvalidAmount(s.to_string());

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > UNIT_DECIMALS
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u64 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<width$}", width = UNIT_DECIMALS);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(MICROS_PER_UNIT)
            .and_then(|micros| micros.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}
