//! # Pricing
//!
//! Turns a cart and an optional discount into the amount the ledger records.
//!
//! ## Order of Operations
//! ```text
//! cart lines ──► Σ unit_price × quantity ──► subtotal
//!                                               │
//!                       discount (whole cart) ──┤
//!                                               ▼
//!   Percent(p): round_half_up(subtotal × (100 − p) / 100)
//!   Fixed(f):   max(0, subtotal − f)        f is in cents, never ×100
//!                                               │
//!                                               ▼
//!                                             total
//! ```
//!
//! The discount is never spread across lines.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartItem, Discount, DiscountKind};
use crate::validation::{validate_cart, validate_discount};

/// Result of pricing a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedCart {
    pub subtotal: Money,
    /// Amount taken off by the discount (`subtotal - total`).
    pub discount: Money,
    pub total: Money,
}

/// Sums `unit_price × quantity` over every line.
///
/// Fails with a validation error if the sum does not fit in an i64.
pub fn subtotal(items: &[CartItem]) -> CoreResult<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        item.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(|| {
                CoreError::from(ValidationError::Overflow {
                    field: "subtotal".to_string(),
                })
            })
    })
}

/// Applies an optional discount to a subtotal.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::apply_discount;
/// use tally_core::Discount;
///
/// let subtotal = Money::from_cents(2000);
/// assert_eq!(apply_discount(subtotal, None).unwrap().cents(), 2000);
/// assert_eq!(apply_discount(subtotal, Some(&Discount::percent(10))).unwrap().cents(), 1800);
/// assert_eq!(apply_discount(subtotal, Some(&Discount::fixed(300))).unwrap().cents(), 1700);
/// assert!(apply_discount(subtotal, Some(&Discount::percent(120))).is_err());
/// ```
pub fn apply_discount(subtotal: Money, discount: Option<&Discount>) -> CoreResult<Money> {
    let Some(discount) = discount else {
        return Ok(subtotal);
    };

    validate_discount(discount)?;

    let total = match discount.kind {
        // validate_discount guarantees 0..=100
        DiscountKind::Percent => subtotal.apply_percent_discount(discount.value as u8),
        DiscountKind::Fixed => subtotal.saturating_discount(Money::from_cents(discount.value)),
    };

    Ok(total)
}

/// Validates the cart and discount, then prices it.
///
/// Nothing is mutated anywhere; a failure here means no sale is attempted.
pub fn price_cart(items: &[CartItem], discount: Option<&Discount>) -> CoreResult<PricedCart> {
    validate_cart(items)?;

    let subtotal = subtotal(items)?;
    let total = apply_discount(subtotal, discount)?;

    Ok(PricedCart {
        subtotal,
        discount: subtotal - total,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
