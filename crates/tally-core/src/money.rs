//! # Money Module
//!
//! Every amount in the till (prices, line totals, discounts, revenue) is
//! an `i64` count of cents. The only rounding step anywhere is the percent
//! discount, and it is explicit.
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;
//! assert_eq!(doubled.cents(), 2198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// An amount of money in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate values may be negative before clamping
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Wraps a cent count.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// The raw cent count.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Cents past the whole unit, 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// No money.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Applies a whole-number percentage discount and returns the new total.
    ///
    /// `total = round(amount × (100 − percent) / 100)` with halves rounded
    /// up (away from zero for the non-negative amounts a cart produces).
    /// The caller guarantees `percent` is within `0..=100`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(2000).apply_percent_discount(10).cents(), 1800);
    /// // 999 × 0.85 = 849.15 → 849
    /// assert_eq!(Money::from_cents(999).apply_percent_discount(15).cents(), 849);
    /// // 5 × 0.5 = 2.5 → 3 (half up)
    /// assert_eq!(Money::from_cents(5).apply_percent_discount(50).cents(), 3);
    /// ```
    pub fn apply_percent_discount(&self, percent: u8) -> Money {
        // i128 keeps `amount × 100` from overflowing on huge carts
        let keep = 100 - i128::from(percent.min(100));
        let scaled = self.0 as i128 * keep;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded as i64)
    }

    /// Subtracts a fixed amount, never going below zero.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(2000);
    /// assert_eq!(subtotal.saturating_discount(Money::from_cents(300)).cents(), 1700);
    /// assert_eq!(subtotal.saturating_discount(Money::from_cents(5000)).cents(), 0);
    /// ```
    pub fn saturating_discount(&self, amount: Money) -> Money {
        Money(self.0.saturating_sub(amount.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation for logs and debugging.
///
/// Localised rendering belongs to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percent_discount_rounding() {
        // 2000 at 10% off = 1800 exactly
        assert_eq!(Money::from_cents(2000).apply_percent_discount(10).cents(), 1800);
        // 1 cent at 50% off = 0.5 → rounds half up to 1
        assert_eq!(Money::from_cents(1).apply_percent_discount(50).cents(), 1);
        // 3 cents at 50% off = 1.5 → 2
        assert_eq!(Money::from_cents(3).apply_percent_discount(50).cents(), 2);
        // 333 at 33% off = 223.11 → 223
        assert_eq!(Money::from_cents(333).apply_percent_discount(33).cents(), 223);
    }

    #[test]
    fn test_percent_discount_bounds() {
        let amount = Money::from_cents(1234);
        assert_eq!(amount.apply_percent_discount(0), amount);
        assert!(amount.apply_percent_discount(100).is_zero());
    }

    #[test]
    fn test_saturating_discount_never_negative() {
        let amount = Money::from_cents(100);
        assert_eq!(amount.saturating_discount(Money::from_cents(100)).cents(), 0);
        assert_eq!(amount.saturating_discount(Money::from_cents(101)).cents(), 0);
        assert_eq!(amount.saturating_discount(Money::zero()).cents(), 100);
    }

    #[test]
    fn test_checked_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_mul_quantity(2).is_none());
        assert!(Money::from_cents(i64::MAX)
            .checked_add(Money::from_cents(1))
            .is_none());
        assert_eq!(
            Money::from_cents(250).checked_mul_quantity(4),
            Some(Money::from_cents(1000))
        );
    }
}
