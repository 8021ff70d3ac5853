//! # Error Types
//!
//! Failures raised by the pure logic in this crate.
//!
//! `ValidationError` describes a single bad field and converts into
//! `CoreError`, which `tally-db` wraps in `DbError` and the bridge turns
//! into an `ApiError` on the wire.
//!
//! Every error also reports an [`ErrorKind`], the four-way taxonomy the
//! boundary uses to pick a response code.

use thiserror::Error;

use crate::types::{ProductId, SaleId};

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification shared by every error type in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any mutation (empty cart, bad discount, bad field).
    Validation,
    /// Unknown product or sale id.
    NotFound,
    /// Duplicate barcode, double void, oversell under a strict stock policy.
    Conflict,
    /// Store unavailable or transaction aborted. Always fully rolled back.
    Persistence,
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain failures from cart checks, discounts and sale state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale was requested with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Discount value outside its allowed range.
    ///
    /// ## When This Occurs
    /// - Percent discount below 0 or above 100
    /// - Negative fixed discount
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(SaleId),

    /// A void was requested for a sale that is already void.
    ///
    /// Voiding is not idempotent: the second attempt is reported, never
    /// silently accepted.
    #[error("Sale {0} is already voided")]
    AlreadyVoided(SaleId),

    /// Another product already uses this barcode.
    #[error("Barcode '{0}' already exists")]
    DuplicateBarcode(String),

    /// Sale would take a product below zero while oversell is rejected.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// The stored line-item snapshot is in a format this build cannot read.
    #[error("Unsupported line-item snapshot: {0}")]
    UnsupportedLineItems(String),

    /// A field failed its check.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EmptyCart | CoreError::InvalidDiscount { .. } | CoreError::Validation(_) => {
                ErrorKind::Validation
            }
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => ErrorKind::NotFound,
            CoreError::AlreadyVoided(_)
            | CoreError::DuplicateBarcode(_)
            | CoreError::InsufficientStock { .. } => ErrorKind::Conflict,
            CoreError::UnsupportedLineItems(_) => ErrorKind::Persistence,
        }
    }

    /// Creates an InvalidDiscount error.
    pub fn invalid_discount(reason: impl Into<String>) -> Self {
        CoreError::InvalidDiscount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// One field that failed its check, reported before anything is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Arithmetic on the value would overflow.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
