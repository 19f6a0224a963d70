use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A monetary amount in whole cents.
///
/// Every amount that flows through the engine is one of these. Percentages are applied
/// with [`Cents::percent`], fractions with [`Ratio::apply`]; neither goes through floating
/// point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(cents: i64) -> Self {
        Cents(cents)
    }

    pub const fn dollars(dollars: i64) -> Self {
        Cents(dollars * 100)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn abs(self) -> Cents {
        Cents(self.0.abs())
    }

    /// Value in dollars, for display and reporting
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Round an amount expressed in (possibly fractional) cents to a whole cent,
    /// half away from zero.
    pub fn round_from(cents: Decimal) -> Cents {
        let rounded = cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let whole = rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Cents(whole)
    }

    /// Multiply by a rate (`dec!(0.20)` for 20%) and round once to the cent.
    pub fn percent(self, rate: Decimal) -> Cents {
        Cents::round_from(Decimal::from(self.0) * rate)
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl Neg for Cents {
    type Output = Cents;

    fn neg(self) -> Cents {
        Cents(-self.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Cents) {
        self.0 -= rhs.0;
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Cents {
        iter.copied().sum()
    }
}

impl fmt::Display for Cents {
    /// `$1,234.56`, negatives as `-$1,234.56`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let dollars = (magnitude / 100).to_string();
        let cents = magnitude % 100;

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}${grouped}.{cents:02}")
    }
}

/// An exact fraction in the closed interval [0, 1].
///
/// Used for dimensionless factors (apportionment ratio, phase-in factor). Kept as a
/// reduced numerator/denominator pair so that applying it to an amount rounds exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Ratio {
    numerator: i64,
    denominator: i64,
}

impl Ratio {
    pub const ZERO: Ratio = Ratio {
        numerator: 0,
        denominator: 1,
    };
    pub const ONE: Ratio = Ratio {
        numerator: 1,
        denominator: 1,
    };

    /// `numerator / denominator` clamped to [0, 1].
    ///
    /// A non-positive denominator has no meaningful quotient; it yields 1 when the
    /// numerator is positive and 0 otherwise.
    pub fn unit_interval(numerator: i64, denominator: i64) -> Ratio {
        if denominator <= 0 {
            return if numerator > 0 { Ratio::ONE } else { Ratio::ZERO };
        }
        if numerator <= 0 {
            Ratio::ZERO
        } else if numerator >= denominator {
            Ratio::ONE
        } else {
            Ratio::reduced(numerator, denominator)
        }
    }

    fn reduced(numerator: i64, denominator: i64) -> Ratio {
        let divisor = gcd(numerator, denominator).max(1);
        Ratio {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        }
    }

    pub fn numerator(self) -> i64 {
        self.numerator
    }

    pub fn denominator(self) -> i64 {
        self.denominator
    }

    pub fn is_zero(self) -> bool {
        self.numerator == 0
    }

    pub fn is_one(self) -> bool {
        self.numerator == self.denominator
    }

    /// `1 - self`
    pub fn complement(self) -> Ratio {
        Ratio::reduced(self.denominator - self.numerator, self.denominator)
    }

    /// Multiply an amount by this fraction, rounding half away from zero once.
    pub fn apply(self, amount: Cents) -> Cents {
        let product = i128::from(amount.0) * i128::from(self.numerator);
        Cents(div_round_half_away(product, i128::from(self.denominator)))
    }

    /// Decimal approximation for display
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.numerator)
            .checked_div(Decimal::from(self.denominator))
            .map(|d| d.round_dp(6))
            .unwrap_or(Decimal::ZERO)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Integer division of `n` by a positive `d`, rounding half away from zero.
fn div_round_half_away(n: i128, d: i128) -> i64 {
    let quotient = n / d;
    let remainder = n % d;
    let rounded = if 2 * remainder.abs() >= d {
        quotient + n.signum()
    } else {
        quotient
    };
    i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
}
