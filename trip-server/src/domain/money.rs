//! Money in minor currency units.
//!
//! All fare arithmetic is integer arithmetic on [`Cents`]. Fractional
//! factors (the taxi vehicle classes) are exact rationals, see
//! [`Multiplier`], so no floating point ever touches an amount.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A non-negative amount in minor currency units (paise, cents).
///
/// # Examples
///
/// ```
/// use trip_server::domain::Cents;
///
/// let fare = Cents::new(120_000) + Cents::new(15_000) + Cents::new(5_000);
/// assert_eq!(fare, Cents::new(140_000));
/// assert_eq!(fare.to_string(), "1400.00");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, rhs: Cents) -> Option<Cents> {
        self.0.checked_add(rhs.0).map(Cents)
    }

    /// Checked multiplication by a unit count; `None` on overflow.
    pub fn checked_mul(self, units: u64) -> Option<Cents> {
        self.0.checked_mul(units).map(Cents)
    }
}

/// Saturating, so a corrupt record cannot wrap around to a small fare.
impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl From<u64> for Cents {
    fn from(value: u64) -> Self {
        Cents(value)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// An exact rational price factor, `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplier {
    numerator: u32,
    denominator: u32,
}

impl Multiplier {
    pub const ONE: Multiplier = Multiplier::ratio(1, 1);
    pub const ONE_AND_HALF: Multiplier = Multiplier::ratio(3, 2);
    pub const TWO: Multiplier = Multiplier::ratio(2, 1);

    /// Build a factor from a ratio. A zero denominator is treated as 1.
    pub const fn ratio(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator: if denominator == 0 { 1 } else { denominator },
        }
    }

    pub fn numerator(self) -> u32 {
        self.numerator
    }

    pub fn denominator(self) -> u32 {
        self.denominator
    }

    /// Scale `amount * units` by this factor, rounding half up once at the end.
    ///
    /// Intermediates are `u128`; results beyond `u64::MAX` saturate.
    pub fn apply(self, amount: Cents, units: u64) -> Cents {
        let scaled = u128::from(amount.get()) * u128::from(units) * u128::from(self.numerator);
        let den = u128::from(self.denominator);
        let rounded = (scaled + den / 2) / den;
        Cents(u64::try_from(rounded).unwrap_or(u64::MAX))
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "x{}", self.numerator)
        } else {
            write!(f, "x{}/{}", self.numerator, self.denominator)
        }
    }
}
