//! # API Error Type
//!
//! Unified error type for bridge commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  CoreError ──────────────┐                                             │
//! │  (validation, not found, │                                             │
//! │   conflict)              ▼                                             │
//! │                       ApiError { code, message } ──► {"success":false} │
//! │  DbError ────────────────▲                                             │
//! │  (sqlx, pool, migrate)   │  logged with error!, generic message        │
//! │                                                                         │
//! │  Bad JSON / unknown command ──► BAD_REQUEST                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence details (SQL text, file paths) never reach the wire; they go
//! to the log and the caller gets a generic message.

use serde::Serialize;
use std::fmt;
use tally_core::{CoreError, ErrorKind};
use tally_db::DbError;
use tracing::error;

/// API error returned from bridge commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Sale not found: 42"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input rejected before any mutation
    ValidationError,

    /// Unknown product or sale
    NotFound,

    /// Duplicate barcode, double void, rejected oversell
    Conflict,

    /// Store unavailable or transaction aborted
    DatabaseError,

    /// Malformed request line, payload or unknown command
    BadRequest,

    /// Response could not be produced
    Internal,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Persistence => ErrorCode::DatabaseError,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ImportRejected(reason) => ApiError::new(ErrorCode::Conflict, reason),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                error!("Connection pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Persistence {
            error!("Stored data could not be read: {}", err);
            return ApiError::new(ErrorCode::DatabaseError, "Stored sale could not be read");
        }

        let message = match &err {
            CoreError::Validation(inner) => inner.to_string(),
            other => other.to_string(),
        };
        ApiError::new(ErrorCode::from(kind), message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::ValidationError;

    #[test]
    fn test_core_errors_map_by_kind() {
        assert_eq!(ApiError::from(CoreError::EmptyCart).code, ErrorCode::ValidationError);
        assert_eq!(ApiError::from(CoreError::SaleNotFound(3)).code, ErrorCode::NotFound);
        assert_eq!(ApiError::from(CoreError::AlreadyVoided(3)).code, ErrorCode::Conflict);
        assert_eq!(
            ApiError::from(CoreError::DuplicateBarcode("123".into())).code,
            ErrorCode::Conflict
        );
    }

    #[test]
    fn test_validation_message_is_unwrapped() {
        let err = ApiError::from(CoreError::from(ValidationError::Required {
            field: "name".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(!err.message.starts_with("Validation error"));
    }

    #[test]
    fn test_persistence_details_stay_off_the_wire() {
        let err = ApiError::from(DbError::QueryFailed("no such table: sales".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("sales"));

        let err = ApiError::from(DbError::Domain(CoreError::UnsupportedLineItems("garbage".into())));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("garbage"));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(ApiError::not_found("Sale", "9")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sale not found: 9");

        let json = serde_json::to_value(ApiError::bad_request("nope")).unwrap();
        assert_eq!(json["code"], "BAD_REQUEST");
    }
}
