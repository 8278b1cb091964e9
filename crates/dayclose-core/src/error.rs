//! # Error Types
//!
//! Domain-specific error types for dayclose-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dayclose-core errors (this file)                                       │
//! │  ├── CoreError        - Lifecycle and ownership rule violations         │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  dayclose-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  dayclose-service errors                                                │
//! │  └── ApiError         - What the caller sees (serialized)               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (submission id, status, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message
//!
//! Note that parse degradations (unreadable numeric cells) are NOT errors:
//! the amount normalizer resolves them to zero by design.

use thiserror::Error;

use crate::status::SubmissionStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent lifecycle rule or ownership violations. They are caught
/// at the operation boundary and translated to structured responses; none
/// of them causes a partial mutation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Outlet cannot be found, is inactive, or belongs to another manager.
    #[error("Outlet not found or not available: {0}")]
    OutletNotFound(String),

    /// Submission cannot be found.
    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    /// A submission already exists for this outlet and date.
    #[error("A submission for outlet {outlet_id} on {report_date} already exists")]
    DuplicateSubmission {
        outlet_id: String,
        report_date: String,
    },

    /// Submission is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Editing a submission that is no longer a draft
    /// - Approving or rejecting expenses on a non-pending submission
    /// - Re-submitting a submission that was never bounced
    #[error("Submission {submission_id} is {current_status}, cannot perform operation")]
    InvalidSubmissionStatus {
        submission_id: String,
        current_status: SubmissionStatus,
    },

    /// The requested status change is not in the lifecycle transition table.
    #[error("Illegal status transition: {from} → {to}")]
    IllegalTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    /// Submission exists but belongs to a different manager.
    #[error("Submission {submission_id} does not belong to manager {manager_id}")]
    NotOwner {
        submission_id: String,
        manager_id: String,
    },

    /// Nothing to act on (e.g. batch submit with no drafts for the date).
    #[error("No draft submissions found for {manager_id} on {report_date}")]
    NothingToSubmit {
        manager_id: String,
        report_date: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements. Used for early
/// validation before any transaction opens.
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. invalid UUID, malformed structured rows).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An expense item carries neither a new upload nor a kept receipt.
    #[error("Expense item {index} has no receipt: attach a file or keep an existing one")]
    ReceiptRequired { index: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
