//! # Submission Repository
//!
//! Database operations for submissions, their expenses-on-write, and the
//! append-only accountant note log.
//!
//! ## Submission Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Submission Lifecycle                                │
//! │                                                                         │
//! │  1. CREATE DRAFT                                                       │
//! │     └── create() → Submission { status: draft }                        │
//! │         (optional lump expense inserted in the same transaction)       │
//! │                                                                         │
//! │  2. EDIT WHILE DRAFT / RE-SUBMIT AFTER BOUNCE                          │
//! │     └── replace_report() → figures + expenses swapped atomically       │
//! │                                                                         │
//! │  3. SUBMIT TO HQ                                                       │
//! │     └── submit_batch() → every draft of the day moves to pending       │
//! │         under ONE shared batch id, or none do                          │
//! │                                                                         │
//! │  4. ACCOUNTANT BOUNCE (see expense repository)                         │
//! │     └── status → resubmit, note appended                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UNIQUE (outlet_id, report_date) constraint makes `create` the sole
//! arbiter of duplicates; a violation surfaces as `DbError::UniqueViolation`.

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dayclose_core::{AccountantNote, Expense, Submission, SubmissionStatus};

/// Repository for submission database operations.
#[derive(Debug, Clone)]
pub struct SubmissionRepository {
    pool: SqlitePool,
}

const SUBMISSION_COLUMNS: &str = "id, code, outlet_id, manager_id, report_date, \
    cash_sales_cents, mp_sales_cents, market_sales_cents, other_sales_cents, \
    total_income_cents, total_expenses_cents, net_amount_cents, \
    status, batch_id, notes, created_at, updated_at, submitted_at, returned_at";

impl SubmissionRepository {
    /// Creates a new SubmissionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SubmissionRepository { pool }
    }

    /// Gets a submission by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    /// Advisory duplicate probe: any submission for (outlet, date)?
    ///
    /// Read-only and non-atomic with any later insert; the UNIQUE
    /// constraint enforced in `create` is what actually prevents
    /// duplicates.
    pub async fn find_by_outlet_date(
        &self,
        outlet_id: &str,
        report_date: NaiveDate,
    ) -> DbResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE outlet_id = ?1 AND report_date = ?2"
        ))
        .bind(outlet_id)
        .bind(report_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    /// Inserts a new draft submission, with its optional lump-sum expense,
    /// in one transaction.
    ///
    /// A second submission for the same (outlet, date) fails here with
    /// `DbError::UniqueViolation` and writes nothing.
    pub async fn create(
        &self,
        submission: &Submission,
        initial_expense: Option<&Expense>,
    ) -> DbResult<()> {
        debug!(id = %submission.id, code = %submission.code, "Creating submission");

        let mut tx = self.pool.begin().await?;

        insert_submission(&mut tx, submission).await?;
        if let Some(expense) = initial_expense {
            insert_expense(&mut tx, expense).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Replaces a submission's figures and entire expense set atomically.
    ///
    /// Used by draft edits (draft → draft) and by the manager's re-submit
    /// (resubmit → pending). The row is only touched while it still has
    /// `expected_status`; anything else means the submission moved under
    /// the caller and nothing is written.
    pub async fn replace_report(
        &self,
        submission: &Submission,
        expenses: &[Expense],
        expected_status: SubmissionStatus,
    ) -> DbResult<()> {
        debug!(
            id = %submission.id,
            expenses = expenses.len(),
            "Replacing submission report"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE submissions SET \
                cash_sales_cents = ?2, mp_sales_cents = ?3, \
                market_sales_cents = ?4, other_sales_cents = ?5, \
                total_income_cents = ?6, total_expenses_cents = ?7, \
                net_amount_cents = ?8, status = ?9, notes = ?10, \
                updated_at = ?11, submitted_at = ?12 \
             WHERE id = ?1 AND status = ?13",
        )
        .bind(&submission.id)
        .bind(submission.cash_sales_cents)
        .bind(submission.mp_sales_cents)
        .bind(submission.market_sales_cents)
        .bind(submission.other_sales_cents)
        .bind(submission.total_income_cents)
        .bind(submission.total_expenses_cents)
        .bind(submission.net_amount_cents)
        .bind(submission.status)
        .bind(&submission.notes)
        .bind(submission.updated_at)
        .bind(submission.submitted_at)
        .bind(expected_status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Submission", &submission.id));
        }

        sqlx::query("DELETE FROM expenses WHERE submission_id = ?1")
            .bind(&submission.id)
            .execute(&mut *tx)
            .await?;

        for expense in expenses {
            insert_expense(&mut tx, expense).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Moves every draft for (manager, date) to pending under one batch id.
    ///
    /// Returns the number of rows that transitioned; zero means there were
    /// no drafts and nothing was written. All selected rows transition or
    /// none do.
    pub async fn submit_batch(
        &self,
        manager_id: &str,
        report_date: NaiveDate,
        batch_id: &str,
    ) -> DbResult<u64> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let drafts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM submissions \
             WHERE manager_id = ?1 AND report_date = ?2 AND status = 'draft'",
        )
        .bind(manager_id)
        .bind(report_date)
        .fetch_one(&mut *tx)
        .await?;

        if drafts == 0 {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE submissions SET \
                status = 'pending', batch_id = ?1, submitted_at = ?2, updated_at = ?2 \
             WHERE manager_id = ?3 AND report_date = ?4 AND status = 'draft'",
        )
        .bind(batch_id)
        .bind(now)
        .bind(manager_id)
        .bind(report_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            manager_id,
            batch_id,
            moved = result.rows_affected(),
            "Batch submitted to HQ"
        );
        Ok(result.rows_affected())
    }

    /// Lists a manager's pending submissions (reconciliation scope).
    pub async fn list_pending_for_manager(&self, manager_id: &str) -> DbResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE manager_id = ?1 AND status = 'pending' \
             ORDER BY report_date, created_at"
        ))
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    /// Lists the submissions sharing a batch id.
    pub async fn list_for_batch(&self, batch_id: &str) -> DbResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE batch_id = ?1 ORDER BY created_at"
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    /// Appends one accountant note (outside any larger transaction).
    pub async fn append_note(&self, note: &AccountantNote) -> DbResult<()> {
        insert_note_pool(&self.pool, note).await
    }

    /// Reads a submission's accountant notes in append order.
    pub async fn list_notes(&self, submission_id: &str) -> DbResult<Vec<AccountantNote>> {
        let notes = sqlx::query_as::<_, AccountantNote>(
            "SELECT id, submission_id, author_id, message, created_at \
             FROM submission_notes WHERE submission_id = ?1 \
             ORDER BY created_at, id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn insert_submission(
    tx: &mut Transaction<'_, Sqlite>,
    submission: &Submission,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO submissions ( \
            id, code, outlet_id, manager_id, report_date, \
            cash_sales_cents, mp_sales_cents, market_sales_cents, other_sales_cents, \
            total_income_cents, total_expenses_cents, net_amount_cents, \
            status, batch_id, notes, created_at, updated_at, submitted_at, returned_at \
         ) VALUES ( \
            ?1, ?2, ?3, ?4, ?5, \
            ?6, ?7, ?8, ?9, \
            ?10, ?11, ?12, \
            ?13, ?14, ?15, ?16, ?17, ?18, ?19 \
         )",
    )
    .bind(&submission.id)
    .bind(&submission.code)
    .bind(&submission.outlet_id)
    .bind(&submission.manager_id)
    .bind(submission.report_date)
    .bind(submission.cash_sales_cents)
    .bind(submission.mp_sales_cents)
    .bind(submission.market_sales_cents)
    .bind(submission.other_sales_cents)
    .bind(submission.total_income_cents)
    .bind(submission.total_expenses_cents)
    .bind(submission.net_amount_cents)
    .bind(submission.status)
    .bind(&submission.batch_id)
    .bind(&submission.notes)
    .bind(submission.created_at)
    .bind(submission.updated_at)
    .bind(submission.submitted_at)
    .bind(submission.returned_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub(crate) async fn insert_expense(
    tx: &mut Transaction<'_, Sqlite>,
    expense: &Expense,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO expenses ( \
            id, submission_id, category_id, amount_cents, description, receipts, \
            status, approver_id, rejection_reason, approved_at, created_at, updated_at \
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(&expense.id)
    .bind(&expense.submission_id)
    .bind(&expense.category_id)
    .bind(expense.amount_cents)
    .bind(&expense.description)
    .bind(&expense.receipts)
    .bind(expense.status)
    .bind(&expense.approver_id)
    .bind(&expense.rejection_reason)
    .bind(expense.approved_at)
    .bind(expense.created_at)
    .bind(expense.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub(crate) async fn insert_note(
    tx: &mut Transaction<'_, Sqlite>,
    note: &AccountantNote,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO submission_notes (id, submission_id, author_id, message, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&note.id)
    .bind(&note.submission_id)
    .bind(&note.author_id)
    .bind(&note.message)
    .bind(note.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_note_pool(pool: &SqlitePool, note: &AccountantNote) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO submission_notes (id, submission_id, author_id, message, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&note.id)
    .bind(&note.submission_id)
    .bind(&note.author_id)
    .bind(&note.message)
    .bind(note.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use dayclose_core::Outlet;
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_outlet(db: &Database, id: &str, manager: &str) {
        db.outlets()
            .insert(&Outlet {
                id: id.to_string(),
                manager_id: manager.to_string(),
                name: format!("Outlet {id}"),
                login_id: Some(format!("L-{id}")),
                is_active: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn draft(outlet: &str, manager: &str, date: &str) -> Submission {
        let now = Utc::now();
        Submission {
            id: Uuid::new_v4().to_string(),
            code: format!("CL-{outlet}-{date}"),
            outlet_id: outlet.to_string(),
            manager_id: manager.to_string(),
            report_date: date.parse().unwrap(),
            cash_sales_cents: 10000,
            mp_sales_cents: 5000,
            market_sales_cents: 0,
            other_sales_cents: 0,
            total_income_cents: 15000,
            total_expenses_cents: 0,
            net_amount_cents: 15000,
            status: SubmissionStatus::Draft,
            batch_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            returned_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        seed_outlet(&db, "o1", "m1").await;

        let submission = draft("o1", "m1", "2024-01-01");
        db.submissions().create(&submission, None).await.unwrap();

        let loaded = db
            .submissions()
            .get_by_id(&submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.code, submission.code);
        assert_eq!(loaded.status, SubmissionStatus::Draft);
        assert_eq!(loaded.net_amount_cents, 15000);
    }

    #[tokio::test]
    async fn test_duplicate_outlet_date_rejected() {
        let db = test_db().await;
        seed_outlet(&db, "o5", "m1").await;

        let first = draft("o5", "m1", "2024-01-01");
        db.submissions().create(&first, None).await.unwrap();

        let second = draft("o5", "m1", "2024-01-01");
        let err = db.submissions().create(&second, None).await.unwrap_err();
        assert!(err.is_unique_violation(), "expected duplicate, got {err:?}");

        // First submission unchanged
        let loaded = db.submissions().get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_income_cents, 15000);
        assert_eq!(loaded.status, SubmissionStatus::Draft);
        // And the duplicate row does not exist
        assert!(db.submissions().get_by_id(&second.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_submit_moves_only_target_date() {
        let db = test_db().await;
        for (i, outlet) in ["a", "b", "c", "d"].iter().enumerate() {
            seed_outlet(&db, outlet, "m1").await;
            let date = if i < 3 { "2024-01-01" } else { "2024-01-02" };
            db.submissions()
                .create(&draft(outlet, "m1", date), None)
                .await
                .unwrap();
        }

        let batch_id = Uuid::new_v4().to_string();
        let moved = db
            .submissions()
            .submit_batch("m1", "2024-01-01".parse().unwrap(), &batch_id)
            .await
            .unwrap();
        assert_eq!(moved, 3);

        let batch = db.submissions().list_for_batch(&batch_id).await.unwrap();
        assert_eq!(batch.len(), 3);
        for submission in &batch {
            assert_eq!(submission.status, SubmissionStatus::Pending);
            assert_eq!(submission.batch_id.as_deref(), Some(batch_id.as_str()));
            assert!(submission.submitted_at.is_some());
        }

        // The other day's draft stays a draft
        let leftover = db
            .submissions()
            .find_by_outlet_date("d", "2024-01-02".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(leftover.status, SubmissionStatus::Draft);
        assert!(leftover.batch_id.is_none());
    }

    #[tokio::test]
    async fn test_batch_submit_with_no_drafts_is_a_no_op() {
        let db = test_db().await;
        seed_outlet(&db, "o1", "m1").await;

        let moved = db
            .submissions()
            .submit_batch("m1", "2024-01-01".parse().unwrap(), "batch-x")
            .await
            .unwrap();
        assert_eq!(moved, 0);
    }

    #[tokio::test]
    async fn test_replace_report_swaps_expenses_atomically() {
        let db = test_db().await;
        seed_outlet(&db, "o1", "m1").await;

        let mut submission = draft("o1", "m1", "2024-01-01");
        db.submissions().create(&submission, None).await.unwrap();

        let now = Utc::now();
        submission.cash_sales_cents = 20000;
        submission.total_income_cents = 25000;
        submission.total_expenses_cents = 3000;
        submission.net_amount_cents = 22000;
        submission.updated_at = now;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            submission_id: submission.id.clone(),
            category_id: "c0000000-0000-0000-0000-000000000003".to_string(),
            amount_cents: 3000,
            description: "Ice and packaging".to_string(),
            receipts: Expense::encode_receipts(&["r1.jpg".to_string()]),
            status: dayclose_core::ExpenseApprovalStatus::Pending,
            approver_id: None,
            rejection_reason: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        db.submissions()
            .replace_report(&submission, &[expense], SubmissionStatus::Draft)
            .await
            .unwrap();

        let loaded = db.submissions().get_by_id(&submission.id).await.unwrap().unwrap();
        assert_eq!(loaded.net_amount_cents, 22000);

        let expenses = db.expenses().list_for_submission(&submission.id).await.unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount_cents, 3000);
    }

    #[tokio::test]
    async fn test_replace_report_requires_expected_status() {
        let db = test_db().await;
        seed_outlet(&db, "o1", "m1").await;

        let submission = draft("o1", "m1", "2024-01-01");
        db.submissions().create(&submission, None).await.unwrap();

        // Pretend the caller thought it was already pending
        let err = db
            .submissions()
            .replace_report(&submission, &[], SubmissionStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_notes_append_in_order() {
        let db = test_db().await;
        seed_outlet(&db, "o1", "m1").await;
        let submission = draft("o1", "m1", "2024-01-01");
        db.submissions().create(&submission, None).await.unwrap();

        for (i, message) in ["first note", "second note"].iter().enumerate() {
            db.submissions()
                .append_note(&AccountantNote {
                    id: format!("n{i}"),
                    submission_id: submission.id.clone(),
                    author_id: "acct-1".to_string(),
                    message: message.to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let notes = db.submissions().list_notes(&submission.id).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].message, "first note");
        assert_eq!(notes[1].message, "second note");
    }
}
