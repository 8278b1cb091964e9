//! # Expense Repository
//!
//! Expense reads, category lookups, and the bulk approval sub-flow.
//!
//! ## Bulk Approval
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Accountant acts on ONE pending submission's uncategorized expenses     │
//! │                                                                         │
//! │  APPROVE                                                               │
//! │    └── every pending uncategorized expense → approved                  │
//! │        (submission status untouched)                                   │
//! │                                                                         │
//! │  REJECT (one transaction, all-or-nothing)                              │
//! │    ├── submission: pending → resubmit, returned_at stamped             │
//! │    ├── every pending uncategorized expense → rejected, with reason     │
//! │    └── ONE accountant note appended (earlier notes untouched)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both operations guard the parent submission's status inside the SQL so
//! a submission that moved under the caller mutates nothing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::submission::insert_note;
use dayclose_core::{AccountantNote, CategoryCode, Expense, ExpenseCategory};

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

const EXPENSE_COLUMNS: &str = "id, submission_id, category_id, amount_cents, description, \
    receipts, status, approver_id, rejection_reason, approved_at, created_at, updated_at";

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Gets all expenses for a submission.
    pub async fn list_for_submission(&self, submission_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE submission_id = ?1 ORDER BY created_at, id"
        ))
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sums a submission's expenses in one category code.
    ///
    /// This is the submitted-expense side of reconciliation: the claim
    /// total compared against the export's payout columns.
    pub async fn sum_for_category(
        &self,
        submission_id: &str,
        code: CategoryCode,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(e.amount_cents) FROM expenses e \
             JOIN expense_categories c ON c.id = e.category_id \
             WHERE e.submission_id = ?1 AND c.code = ?2",
        )
        .bind(submission_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Approves every pending uncategorized expense of a pending submission.
    ///
    /// Returns the number of expense rows changed. The submission itself
    /// stays pending; approval of the figures is a separate concern.
    pub async fn approve_uncategorized(
        &self,
        submission_id: &str,
        approver_id: &str,
    ) -> DbResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE expenses SET \
                status = 'approved', approver_id = ?1, approved_at = ?2, updated_at = ?2 \
             WHERE submission_id = ?3 \
               AND status = 'pending' \
               AND category_id = (SELECT id FROM expense_categories WHERE code = 'uncategorized') \
               AND EXISTS (SELECT 1 FROM submissions s \
                           WHERE s.id = ?3 AND s.status = 'pending')",
        )
        .bind(approver_id)
        .bind(now)
        .bind(submission_id)
        .execute(&self.pool)
        .await?;

        debug!(
            submission_id,
            approved = result.rows_affected(),
            "Approved uncategorized expenses"
        );
        Ok(result.rows_affected())
    }

    /// Rejects a pending submission's uncategorized expenses and bounces
    /// the submission back to the manager, in one transaction.
    ///
    /// The caller supplies the note row to append; the reason has already
    /// been validated non-empty at the operation boundary. Returns the
    /// number of expense rows changed. Failure at any step rolls the whole
    /// transaction back.
    pub async fn reject_uncategorized(
        &self,
        submission_id: &str,
        reason: &str,
        approver_id: &str,
        note: &AccountantNote,
    ) -> DbResult<u64> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // The pending guard lives on the submission update; a submission
        // that is no longer pending leaves rows_affected at 0 and the
        // transaction rolls back untouched.
        let moved = sqlx::query(
            "UPDATE submissions SET \
                status = 'resubmit', returned_at = ?1, updated_at = ?1 \
             WHERE id = ?2 AND status = 'pending'",
        )
        .bind(now)
        .bind(submission_id)
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            return Err(DbError::not_found("Pending submission", submission_id));
        }

        let expenses = sqlx::query(
            "UPDATE expenses SET \
                status = 'rejected', rejection_reason = ?1, approver_id = ?2, \
                approved_at = ?3, updated_at = ?3 \
             WHERE submission_id = ?4 \
               AND status = 'pending' \
               AND category_id = (SELECT id FROM expense_categories WHERE code = 'uncategorized')",
        )
        .bind(reason)
        .bind(approver_id)
        .bind(now)
        .bind(submission_id)
        .execute(&mut *tx)
        .await?;

        insert_note(&mut tx, note).await?;

        tx.commit().await?;

        debug!(
            submission_id,
            rejected = expenses.rows_affected(),
            "Rejected uncategorized expenses, submission bounced"
        );
        Ok(expenses.rows_affected())
    }

    /// Looks up a category by its code.
    pub async fn category_by_code(&self, code: CategoryCode) -> DbResult<Option<ExpenseCategory>> {
        let category = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, name, code, is_active, created_at \
             FROM expense_categories WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists active categories.
    pub async fn list_categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, name, code, is_active, created_at \
             FROM expense_categories WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use dayclose_core::{ExpenseApprovalStatus, Outlet, Submission, SubmissionStatus};
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// One pending submission with a lump uncategorized expense.
    async fn seed_pending(db: &Database, expense_cents: i64) -> Submission {
        let now = Utc::now();
        db.outlets()
            .insert(&Outlet {
                id: "o1".to_string(),
                manager_id: "m1".to_string(),
                name: "Jalan Ipoh".to_string(),
                login_id: Some("A100".to_string()),
                is_active: true,
                created_at: now,
            })
            .await
            .unwrap();

        let uncategorized = db
            .expenses()
            .category_by_code(CategoryCode::Uncategorized)
            .await
            .unwrap()
            .unwrap();

        let submission = Submission {
            id: Uuid::new_v4().to_string(),
            code: "CL-o1-2024-01-01".to_string(),
            outlet_id: "o1".to_string(),
            manager_id: "m1".to_string(),
            report_date: "2024-01-01".parse().unwrap(),
            cash_sales_cents: 50000,
            mp_sales_cents: 0,
            market_sales_cents: 0,
            other_sales_cents: 0,
            total_income_cents: 50000,
            total_expenses_cents: expense_cents,
            net_amount_cents: 50000 - expense_cents,
            status: SubmissionStatus::Pending,
            batch_id: Some("batch-1".to_string()),
            notes: None,
            created_at: now,
            updated_at: now,
            submitted_at: Some(now),
            returned_at: None,
        };

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            submission_id: submission.id.clone(),
            category_id: uncategorized.id,
            amount_cents: expense_cents,
            description: "Daily expenses".to_string(),
            receipts: "[]".to_string(),
            status: ExpenseApprovalStatus::Pending,
            approver_id: None,
            rejection_reason: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        db.submissions().create(&submission, Some(&expense)).await.unwrap();
        submission
    }

    fn note_for(submission: &Submission, message: &str) -> AccountantNote {
        AccountantNote {
            id: Uuid::new_v4().to_string(),
            submission_id: submission.id.clone(),
            author_id: "acct-1".to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_approve_stamps_and_counts() {
        let db = test_db().await;
        let submission = seed_pending(&db, 2500).await;

        let approved = db
            .expenses()
            .approve_uncategorized(&submission.id, "acct-1")
            .await
            .unwrap();
        assert_eq!(approved, 1);

        let expenses = db.expenses().list_for_submission(&submission.id).await.unwrap();
        assert_eq!(expenses[0].status, ExpenseApprovalStatus::Approved);
        assert_eq!(expenses[0].approver_id.as_deref(), Some("acct-1"));
        assert!(expenses[0].approved_at.is_some());

        // Approve does not move the submission
        let loaded = db.submissions().get_by_id(&submission.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SubmissionStatus::Pending);
    }

    #[tokio::test]
    async fn test_approve_on_non_pending_changes_nothing() {
        let db = test_db().await;
        let submission = seed_pending(&db, 2500).await;

        // Bounce it first
        let note = note_for(&submission, "Returned: missing receipt");
        db.expenses()
            .reject_uncategorized(&submission.id, "missing receipt", "acct-1", &note)
            .await
            .unwrap();

        let approved = db
            .expenses()
            .approve_uncategorized(&submission.id, "acct-2")
            .await
            .unwrap();
        assert_eq!(approved, 0);
    }

    #[tokio::test]
    async fn test_reject_flow() {
        let db = test_db().await;
        let submission = seed_pending(&db, 2500).await;

        // A pre-existing note must survive verbatim
        db.submissions()
            .append_note(&note_for(&submission, "Checked totals, looks off"))
            .await
            .unwrap();

        let note = note_for(&submission, "Returned: missing receipt");
        let rejected = db
            .expenses()
            .reject_uncategorized(&submission.id, "missing receipt", "acct-1", &note)
            .await
            .unwrap();
        assert_eq!(rejected, 1);

        let loaded = db.submissions().get_by_id(&submission.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SubmissionStatus::Resubmit);
        assert!(loaded.returned_at.is_some());

        let expenses = db.expenses().list_for_submission(&submission.id).await.unwrap();
        assert_eq!(expenses[0].status, ExpenseApprovalStatus::Rejected);
        assert_eq!(expenses[0].rejection_reason.as_deref(), Some("missing receipt"));

        // Exactly one new note, prior note preserved
        let notes = db.submissions().list_notes(&submission.id).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].message, "Checked totals, looks off");
        assert_eq!(notes[1].message, "Returned: missing receipt");
    }

    #[tokio::test]
    async fn test_reject_non_pending_rolls_back() {
        let db = test_db().await;
        let submission = seed_pending(&db, 2500).await;

        let first_note = note_for(&submission, "bounce");
        db.expenses()
            .reject_uncategorized(&submission.id, "missing receipt", "acct-1", &first_note)
            .await
            .unwrap();

        // Second reject hits a resubmit-status submission: typed error,
        // and no second note appears
        let second_note = note_for(&submission, "bounce again");
        let err = db
            .expenses()
            .reject_uncategorized(&submission.id, "still wrong", "acct-1", &second_note)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let notes = db.submissions().list_notes(&submission.id).await.unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_sum_for_category() {
        let db = test_db().await;
        let submission = seed_pending(&db, 2500).await;

        let total = db
            .expenses()
            .sum_for_category(&submission.id, CategoryCode::Uncategorized)
            .await
            .unwrap();
        assert_eq!(total, 2500);

        let other = db
            .expenses()
            .sum_for_category(&submission.id, CategoryCode::MpBerhad)
            .await
            .unwrap();
        assert_eq!(other, 0);
    }

    #[tokio::test]
    async fn test_categories_seeded() {
        let db = test_db().await;
        let categories = db.expenses().list_categories().await.unwrap();
        assert_eq!(categories.len(), 4);
        assert!(db
            .expenses()
            .category_by_code(CategoryCode::MpBerhad)
            .await
            .unwrap()
            .is_some());
    }
}
