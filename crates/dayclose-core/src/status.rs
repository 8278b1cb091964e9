//! # Submission Lifecycle
//!
//! The closed status enum and its transition table.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Submission Lifecycle                                │
//! │                                                                         │
//! │   draft ──────────────► pending ──────────────► verified (terminal)    │
//! │   (batch submit)           │    ──────────────► rejected (terminal)    │
//! │                            │                                            │
//! │                            ▼ (accountant bounces)                       │
//! │                        resubmit                                         │
//! │                            │                                            │
//! │                            ▼ (manager re-submits, same identity)        │
//! │                         pending                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every status change in the system goes through [`SubmissionStatus::transition`];
//! there are no ad hoc status assignments scattered across operations. An
//! illegal transition is a typed error, not a silent overwrite.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Submission Status
// =============================================================================

/// The status of a daily closing submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Editable by the manager, one per outlet per date.
    Draft,
    /// Submitted to HQ, immutable to the manager, awaiting accountant action.
    Pending,
    /// Bounced back by the accountant; manager must correct and re-submit.
    Resubmit,
    /// Accepted by accounting (terminal).
    Verified,
    /// Refused by accounting (terminal).
    Rejected,
}

impl SubmissionStatus {
    /// Checks whether `self → to` is a legal lifecycle transition.
    pub fn can_transition(self, to: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, to),
            (Draft, Pending) | (Pending, Resubmit) | (Pending, Verified) | (Pending, Rejected)
                | (Resubmit, Pending)
        )
    }

    /// Returns the target status, or a typed error for an illegal move.
    ///
    /// ## Example
    /// ```rust
    /// use dayclose_core::status::SubmissionStatus;
    ///
    /// let next = SubmissionStatus::Draft.transition(SubmissionStatus::Pending);
    /// assert!(next.is_ok());
    ///
    /// let bad = SubmissionStatus::Verified.transition(SubmissionStatus::Draft);
    /// assert!(bad.is_err());
    /// ```
    pub fn transition(self, to: SubmissionStatus) -> Result<SubmissionStatus, CoreError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(CoreError::IllegalTransition { from: self, to })
        }
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Verified | SubmissionStatus::Rejected)
    }

    /// The lowercase wire/database form of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Resubmit => "resubmit",
            SubmissionStatus::Verified => "verified",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::Draft
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Expense Approval Status
// =============================================================================

/// Approval status of a single expense entry.
///
/// Only mutable while the parent submission is [`SubmissionStatus::Pending`];
/// that precondition is enforced at the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ExpenseApprovalStatus {
    fn default() -> Self {
        ExpenseApprovalStatus::Pending
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use SubmissionStatus::*;
        assert!(Draft.can_transition(Pending));
        assert!(Pending.can_transition(Resubmit));
        assert!(Pending.can_transition(Verified));
        assert!(Pending.can_transition(Rejected));
        assert!(Resubmit.can_transition(Pending));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        use SubmissionStatus::*;
        assert!(!Draft.can_transition(Verified));
        assert!(!Draft.can_transition(Resubmit));
        assert!(!Pending.can_transition(Draft));
        assert!(!Resubmit.can_transition(Draft));
        assert!(!Verified.can_transition(Pending));
        assert!(!Rejected.can_transition(Pending));
        assert!(!Pending.can_transition(Pending));
    }

    #[test]
    fn test_transition_returns_typed_error() {
        let err = SubmissionStatus::Verified
            .transition(SubmissionStatus::Pending)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::IllegalTransition {
                from: SubmissionStatus::Verified,
                to: SubmissionStatus::Pending
            }
        ));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SubmissionStatus::Verified.is_terminal());
        assert!(SubmissionStatus::Rejected.is_terminal());
        assert!(!SubmissionStatus::Pending.is_terminal());
        assert!(!SubmissionStatus::Draft.is_terminal());
        assert!(!SubmissionStatus::Resubmit.is_terminal());
    }

    #[test]
    fn test_default_is_draft() {
        assert_eq!(SubmissionStatus::default(), SubmissionStatus::Draft);
    }
}
