//! # API Error Type
//!
//! Unified error type for operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Dayclose                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Operation Function                                              │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Validation Error? ── before any transaction ──────┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Precondition Error? ── status/ownership ──────── ApiError ────►│  │
//! │  │         │                                          ▲            │  │
//! │  │         ▼                                          │            │  │
//! │  │  Database Error? ── rolled back, detail logged ────┘            │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  The caller receives { code, message }; persistence detail stays in    │
//! │  the server log.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use dayclose_core::{CoreError, ValidationError};
use dayclose_db::DbError;

/// API error returned from operations.
///
/// ## Serialization
/// This is what the caller receives when an operation fails:
/// ```json
/// {
///   "code": "PRECONDITION_FAILED",
///   "message": "Submission sub-1 is resubmit, cannot perform operation"
/// }
/// ```
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Security token missing, expired or already used (401)
    TokenRejected,

    /// Lifecycle or ownership precondition failed (422)
    PreconditionFailed,

    /// A submission already exists for this outlet and date (409)
    Duplicate,

    /// Receipt upload collaborator failed (502)
    UploadFailed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
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
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a token rejection error.
    pub fn token_rejected() -> Self {
        ApiError::new(
            ErrorCode::TokenRejected,
            "Security token missing, expired or already used",
        )
    }

    /// Creates a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::PreconditionFailed, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP status for the surrounding transport layer.
    pub fn http_status(&self) -> u16 {
        match self.code {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::TokenRejected => 401,
            ErrorCode::PreconditionFailed => 422,
            ErrorCode::Duplicate => 409,
            ErrorCode::UploadFailed => 502,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

/// Converts database errors to API errors.
///
/// Transient persistence detail is logged server-side; the caller only
/// sees a generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => ApiError::new(
                ErrorCode::Duplicate,
                format!("Duplicate value for {}", field),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutletNotFound(id) => ApiError::not_found("Outlet", &id),
            CoreError::SubmissionNotFound(id) => ApiError::not_found("Submission", &id),
            CoreError::DuplicateSubmission {
                outlet_id,
                report_date,
            } => ApiError::new(
                ErrorCode::Duplicate,
                format!(
                    "A submission for outlet {} on {} already exists",
                    outlet_id, report_date
                ),
            ),
            CoreError::InvalidSubmissionStatus { .. }
            | CoreError::IllegalTransition { .. }
            | CoreError::NotOwner { .. }
            | CoreError::NothingToSubmit { .. } => ApiError::precondition(err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts validation errors directly (most validators return these).
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================
