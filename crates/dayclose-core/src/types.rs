//! # Domain Types
//!
//! Core domain types used throughout Dayclose.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Submission    │   │    Expense      │   │ExternalSalesRow │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (business)│   │  submission_id  │   │  scope_kind/ref │       │
//! │  │  status         │   │  status         │   │  row_index      │       │
//! │  │  *_cents        │   │  amount_cents   │   │  nine text cols │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Outlet      │   │ ExpenseCategory │   │ AccountantNote  │       │
//! │  │  (config data)  │   │  (config data)  │   │  (append-only)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: submission `code`, outlet `login_id`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::normalize::NormalizedRow;
use crate::status::{ExpenseApprovalStatus, SubmissionStatus};
use crate::stream::SalesStream;

// =============================================================================
// Outlet
// =============================================================================

/// A retail outlet managed by one manager.
///
/// Outlets are configuration data: seeded, not created by this core.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Outlet {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Manager this outlet belongs to.
    pub manager_id: String,

    /// Display name, also the join key for name-matched reconciliation.
    pub name: String,

    /// External platform login id, the join key for id-matched
    /// reconciliation. Not every outlet has one.
    pub login_id: Option<String>,

    /// Whether the outlet is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Income Figures
// =============================================================================

/// The four declared income streams of one closing report.
///
/// Total income is always derived from these four; it is never accepted
/// from the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IncomeFigures {
    pub cash_cents: i64,
    pub mp_berhad_cents: i64,
    pub market_cents: i64,
    pub other_cents: i64,
}

impl IncomeFigures {
    /// Sum of the four income streams.
    pub fn total(&self) -> Money {
        Money::from_cents(
            self.cash_cents + self.mp_berhad_cents + self.market_cents + self.other_cents,
        )
    }
}

// =============================================================================
// Submission
// =============================================================================

/// One outlet's one-day financial closing report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Submission {
    pub id: String,

    /// Human-readable business code, e.g. `CL-20240101-4821`.
    pub code: String,

    pub outlet_id: String,
    pub manager_id: String,

    /// Report date; unique per outlet (database-enforced).
    #[ts(as = "String")]
    pub report_date: NaiveDate,

    /// Declared income streams.
    pub cash_sales_cents: i64,
    pub mp_sales_cents: i64,
    pub market_sales_cents: i64,
    pub other_sales_cents: i64,

    /// Derived: sum of the four income streams.
    pub total_income_cents: i64,

    /// Derived: sum of the submission's expense entries.
    pub total_expenses_cents: i64,

    /// Derived: income − expenses. Never stored independently of its
    /// inputs; always rewritten atomically with them.
    pub net_amount_cents: i64,

    pub status: SubmissionStatus,

    /// Shared identifier stamped when a day's drafts go to HQ together.
    pub batch_id: Option<String>,

    /// Manager's free-text notes.
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// When the submission last moved to `pending`.
    #[ts(as = "Option<String>")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the submission was last bounced back to the manager.
    #[ts(as = "Option<String>")]
    pub returned_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Returns the total income as Money.
    #[inline]
    pub fn total_income(&self) -> Money {
        Money::from_cents(self.total_income_cents)
    }

    /// Returns the total expenses as Money.
    #[inline]
    pub fn total_expenses(&self) -> Money {
        Money::from_cents(self.total_expenses_cents)
    }

    /// Returns the net amount as Money.
    #[inline]
    pub fn net_amount(&self) -> Money {
        Money::from_cents(self.net_amount_cents)
    }

    /// The declared amount for one sales stream, as used by reconciliation.
    pub fn declared_for_stream(&self, stream: SalesStream) -> Money {
        match stream {
            SalesStream::MpBerhad => Money::from_cents(self.mp_sales_cents),
            SalesStream::Market => Money::from_cents(self.market_sales_cents),
        }
    }
}

// =============================================================================
// Accountant Note
// =============================================================================

/// One entry in a submission's append-only accountant log.
///
/// The log is an ordered sequence of attributed, timestamped rows; rejecting
/// a submission appends exactly one and never touches earlier entries.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AccountantNote {
    pub id: String,
    pub submission_id: String,
    /// Accountant who wrote the note.
    pub author_id: String,
    pub message: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense Category
// =============================================================================

/// Category classifier, resolved once at configuration load.
///
/// Operations dispatch on this code; category display names are free to
/// drift without breaking matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CategoryCode {
    MpBerhad,
    Market,
    Other,
    /// The lump-sum marker for expense totals awaiting itemization.
    Uncategorized,
}

/// An expense category (config data, seeded by migration).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExpenseCategory {
    pub id: String,
    pub name: String,
    pub code: CategoryCode,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// A single expense entry under a submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub submission_id: String,
    pub category_id: String,
    pub amount_cents: i64,
    pub description: String,

    /// Stored receipt filenames as a JSON array (zero or more).
    pub receipts: String,

    pub status: ExpenseApprovalStatus,
    /// Accountant who approved or rejected the entry.
    pub approver_id: Option<String>,
    pub rejection_reason: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Returns the expense amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Decodes the receipt filename list.
    ///
    /// A malformed stored value decodes as an empty list rather than an
    /// error; the column is always written from `encode_receipts`.
    pub fn receipt_list(&self) -> Vec<String> {
        serde_json::from_str(&self.receipts).unwrap_or_default()
    }

    /// Encodes a receipt filename list for storage.
    pub fn encode_receipts(receipts: &[String]) -> String {
        serde_json::to_string(receipts).unwrap_or_else(|_| "[]".to_string())
    }
}

// =============================================================================
// External Sales Snapshot
// =============================================================================

/// The unit an external-sales snapshot is replaced against as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotScopeKind {
    /// Rows pasted against a single submission.
    Submission,
    /// Rows pasted against one manager's whole batch.
    Manager,
}

/// A concrete snapshot scope: the kind plus the id it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reference")]
pub enum SnapshotScope {
    /// Rows for a single submission.
    Submission(String),
    /// Rows for one manager's batch.
    Manager(String),
}

impl SnapshotScope {
    pub fn kind(&self) -> SnapshotScopeKind {
        match self {
            SnapshotScope::Submission(_) => SnapshotScopeKind::Submission,
            SnapshotScope::Manager(_) => SnapshotScopeKind::Manager,
        }
    }

    pub fn reference(&self) -> &str {
        match self {
            SnapshotScope::Submission(id) | SnapshotScope::Manager(id) => id,
        }
    }
}

/// One persisted row of an external sales export snapshot.
///
/// Snapshots are never patched in place: saving a scope deletes all its
/// rows and reinserts the new set, preserving paste order via `row_index`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExternalSalesRow {
    pub id: String,
    pub scope_kind: SnapshotScopeKind,
    /// Submission id or manager id, depending on `scope_kind`.
    pub scope_ref: String,
    /// Position in the original paste.
    pub row_index: i64,

    pub login_id: String,
    pub outlet_name: String,
    pub level: String,
    pub ticket_count: String,
    pub total_deposit: String,
    pub total_withdraw: String,
    pub company_sales: String,
    pub company_profit: String,
    pub company_payout: String,

    /// Accountant who saved the snapshot.
    pub saved_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ExternalSalesRow {
    /// Re-creates the in-memory normalized form, e.g. to re-run matching
    /// over a stored snapshot.
    pub fn to_normalized(&self) -> NormalizedRow {
        NormalizedRow {
            row_index: self.row_index as usize,
            login_id: self.login_id.clone(),
            outlet_name: self.outlet_name.clone(),
            level: self.level.clone(),
            ticket_count: self.ticket_count.clone(),
            total_deposit: self.total_deposit.clone(),
            total_withdraw: self.total_withdraw.clone(),
            company_sales: self.company_sales.clone(),
            company_profit: self.company_profit.clone(),
            company_payout: self.company_payout.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_total() {
        let figures = IncomeFigures {
            cash_cents: 100,
            mp_berhad_cents: 200,
            market_cents: 300,
            other_cents: 400,
        };
        assert_eq!(figures.total(), Money::from_cents(1000));
    }

    #[test]
    fn test_receipt_list_round_trip() {
        let encoded = Expense::encode_receipts(&["a.jpg".to_string(), "b.jpg".to_string()]);
        let expense = Expense {
            id: "e1".to_string(),
            submission_id: "s1".to_string(),
            category_id: "c1".to_string(),
            amount_cents: 100,
            description: "test".to_string(),
            receipts: encoded,
            status: ExpenseApprovalStatus::Pending,
            approver_id: None,
            rejection_reason: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(expense.receipt_list(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_receipt_list_malformed_is_empty() {
        let expense = Expense {
            id: "e1".to_string(),
            submission_id: "s1".to_string(),
            category_id: "c1".to_string(),
            amount_cents: 100,
            description: "test".to_string(),
            receipts: "not-json".to_string(),
            status: ExpenseApprovalStatus::Pending,
            approver_id: None,
            rejection_reason: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(expense.receipt_list().is_empty());
    }
}
