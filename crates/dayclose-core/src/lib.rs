//! # dayclose-core: Pure Business Logic for Dayclose
//!
//! This crate is the **heart** of Dayclose. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dayclose Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Operation Boundary (dayclose-service)          │   │
//! │  │   create_submission, submit_batch, reject_expenses,             │   │
//! │  │   save_external_sales, reconcile_stream, ...                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dayclose-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  status  │ │  money   │ │ ingest/normalize │  │   │
//! │  │   │Submission│ │ lifecycle│ │  amount  │ │    reconcile     │  │   │
//! │  │   │ Expense  │ │  table   │ │  parser  │ │     matcher      │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  dayclose-db (Database Layer)                   │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Submission, Expense, ExternalSalesRow, etc.)
//! - [`status`] - The closed submission lifecycle and its transition table
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`amount`] - Lenient free-text amount parsing (degrades to zero)
//! - [`ingest`] - Delimiter detection and pasted-text row parsing
//! - [`normalize`] - Mapping ingested rows onto a stream's schema
//! - [`stream`] - Per-stream reconciliation configuration
//! - [`reconcile`] - The reconciliation matcher
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod amount;
pub mod error;
pub mod ingest;
pub mod money;
pub mod normalize;
pub mod reconcile;
pub mod status;
pub mod stream;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use dayclose_core::Money` instead of
// `use dayclose_core::money::Money`

pub use amount::parse_amount;
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use normalize::NormalizedRow;
pub use reconcile::{MatchStatus, PendingClaim, ReconciliationResult};
pub use status::{ExpenseApprovalStatus, SubmissionStatus};
pub use stream::{ExternalField, JoinKey, SalesStream};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tolerance below which a compared pair of amounts counts as equal.
///
/// ±0.01 currency units: with integer-cent money this is an exact
/// one-cent comparison, never a float epsilon.
pub const RECON_TOLERANCE: Money = Money::from_cents(1);

/// Maximum stored length of one normalized external-sales cell.
pub const MAX_FIELD_LEN: usize = 120;

/// Maximum length of a rejection reason.
pub const MAX_REASON_LEN: usize = 500;

/// Maximum length of manager notes on a submission.
pub const MAX_NOTES_LEN: usize = 2000;

/// Maximum length of an expense description.
pub const MAX_DESCRIPTION_LEN: usize = 500;
