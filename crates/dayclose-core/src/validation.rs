//! # Validation Module
//!
//! Input validation utilities for Dayclose.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operation boundary (dayclose-service)                         │
//! │  ├── Deserialization / type validation                                  │
//! │  └── THIS MODULE: field rules, before any transaction opens             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                             │
//! │  ├── NOT NULL constraints                                               │
//! │  ├── UNIQUE (outlet_id, report_date)  ← the duplicate arbiter           │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note the asymmetry with the amount normalizer: a bad numeric cell in a
//! pasted export degrades to zero, but a bad identifier or an empty
//! rejection reason is a hard error raised here.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_DESCRIPTION_LEN, MAX_NOTES_LEN, MAX_REASON_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a UUID identifier.
///
/// ## Example
/// ```rust
/// use dayclose_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses and validates a report date in `YYYY-MM-DD` form.
pub fn validate_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a date in YYYY-MM-DD form".to_string(),
    })
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates a rejection reason: required, non-empty, bounded.
///
/// Returns the trimmed reason.
pub fn validate_reason(raw: &str) -> ValidationResult<String> {
    let reason = raw.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(reason.to_string())
}

/// Validates optional free-text notes; empty input becomes None.
pub fn validate_notes(raw: Option<&str>) -> ValidationResult<Option<String>> {
    let notes = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(notes) => notes,
    };

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates an expense description.
pub fn validate_description(raw: &str) -> ValidationResult<String> {
    let description = raw.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(description.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a declared amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a stream with no takings that day)
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
