//! # Submission Operations
//!
//! Manager-facing lifecycle operations: create, edit, re-submit after a
//! bounce, the advisory duplicate probe, and the batch submit that moves a
//! whole day to HQ.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{ApiError, ErrorCode};
use crate::ops::count_phrase;
use crate::ClosingService;
use dayclose_core::validation::{
    validate_amount_cents, validate_date, validate_description, validate_notes,
};
use dayclose_core::{
    CategoryCode, CoreError, Expense, ExpenseApprovalStatus, IncomeFigures, Outlet, Submission,
    SubmissionStatus, ValidationError,
};

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// One receipt file attached to a request, before storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One itemized expense in an update/resubmit payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItemInput {
    pub category: CategoryCode,
    pub amount_cents: i64,
    pub description: String,
    /// New file to store for this item, if any.
    pub upload: Option<ReceiptUpload>,
    /// Previously stored filenames the manager chose to keep.
    pub kept_receipts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub token: String,
    pub manager_id: String,
    pub outlet_id: String,
    /// Report date in YYYY-MM-DD form.
    pub report_date: String,
    pub income: IncomeFigures,
    pub notes: Option<String>,
    /// Optional aggregate expense figure, recorded as one uncategorized
    /// entry pending later itemization.
    pub expense_total_cents: Option<i64>,
    /// Receipt for the aggregate expense, if the manager attached one.
    pub receipt: Option<ReceiptUpload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmissionRequest {
    pub token: String,
    pub manager_id: String,
    pub submission_id: String,
    pub income: IncomeFigures,
    pub notes: Option<String>,
    /// Full replacement set; previous itemized expenses are discarded.
    pub expense_items: Vec<ExpenseItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResubmitSubmissionRequest {
    pub token: String,
    pub manager_id: String,
    pub submission_id: String,
    /// Corrected figures; None keeps the declared figures as they are.
    pub income: Option<IncomeFigures>,
    pub notes: Option<String>,
    /// Corrected expense set; None keeps the existing entries.
    pub expense_items: Option<Vec<ExpenseItemInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub success: bool,
    pub submission_id: String,
    pub submission_code: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmitRequest {
    pub token: String,
    pub manager_id: String,
    /// Target date in YYYY-MM-DD form.
    pub report_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmitResponse {
    pub success: bool,
    pub message: String,
    pub batch_id: String,
    pub submitted_count: u64,
}

/// Advisory pre-submit probe result. Not a substitute for the database
/// uniqueness constraint checked at create time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResponse {
    pub exists: bool,
    pub submission_id: Option<String>,
    pub status: Option<SubmissionStatus>,
}

// =============================================================================
// Operations
// =============================================================================

impl ClosingService {
    /// Creates a draft submission for one outlet and date.
    pub async fn create_submission(
        &self,
        req: CreateSubmissionRequest,
    ) -> Result<SubmissionResponse, ApiError> {
        self.consume_token(&req.token)?;

        require("manager_id", &req.manager_id)?;
        require("outlet_id", &req.outlet_id)?;
        let report_date = validate_date("report_date", &req.report_date)?;
        validate_income(&req.income)?;
        if let Some(total) = req.expense_total_cents {
            validate_amount_cents("expense_total", total)?;
        }
        let notes = validate_notes(req.notes.as_deref())?;

        let outlet = self
            .db()
            .outlets()
            .get_active_for_manager(&req.outlet_id, &req.manager_id)
            .await?
            .ok_or_else(|| CoreError::OutletNotFound(req.outlet_id.clone()))?;

        // Advisory pre-check; the UNIQUE constraint below remains the
        // arbiter when two creates race
        if self
            .db()
            .submissions()
            .find_by_outlet_date(&req.outlet_id, report_date)
            .await?
            .is_some()
        {
            return Err(duplicate_error(&req.outlet_id, report_date));
        }

        let now = Utc::now();
        let submission_id = Uuid::new_v4().to_string();
        let code = generate_submission_code(&outlet, report_date);
        let mut warnings = Vec::new();

        let initial_expense = match req.expense_total_cents.filter(|cents| *cents > 0) {
            Some(total) => Some(
                self.build_lump_expense(&submission_id, total, req.receipt.as_ref(), &mut warnings, now)
                    .await?,
            ),
            None => None,
        };

        let total_income = req.income.total().cents();
        let total_expenses = initial_expense.as_ref().map(|e| e.amount_cents).unwrap_or(0);

        let submission = Submission {
            id: submission_id.clone(),
            code: code.clone(),
            outlet_id: req.outlet_id.clone(),
            manager_id: req.manager_id.clone(),
            report_date,
            cash_sales_cents: req.income.cash_cents,
            mp_sales_cents: req.income.mp_berhad_cents,
            market_sales_cents: req.income.market_cents,
            other_sales_cents: req.income.other_cents,
            total_income_cents: total_income,
            total_expenses_cents: total_expenses,
            net_amount_cents: total_income - total_expenses,
            status: SubmissionStatus::Draft,
            batch_id: None,
            notes,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            returned_at: None,
        };

        match self
            .db()
            .submissions()
            .create(&submission, initial_expense.as_ref())
            .await
        {
            Ok(()) => {}
            // Race lost between the advisory check and the insert
            Err(err) if err.is_unique_violation() => {
                return Err(duplicate_error(&req.outlet_id, report_date));
            }
            Err(err) => return Err(err.into()),
        }

        info!(submission_id = %submission_id, code = %code, "Submission created");

        Ok(SubmissionResponse {
            success: true,
            submission_id,
            submission_code: code,
            warnings,
        })
    }

    /// Replaces a draft's figures and itemized expenses.
    pub async fn update_submission(
        &self,
        req: UpdateSubmissionRequest,
    ) -> Result<SubmissionResponse, ApiError> {
        self.consume_token(&req.token)?;

        require("manager_id", &req.manager_id)?;
        require("submission_id", &req.submission_id)?;
        validate_income(&req.income)?;
        let notes = validate_notes(req.notes.as_deref())?;
        validate_expense_items(&req.expense_items)?;

        let submission = self.load_owned(&req.submission_id, &req.manager_id).await?;
        if submission.status != SubmissionStatus::Draft {
            return Err(status_error(&submission));
        }

        let now = Utc::now();
        let expenses = self
            .build_expense_rows(&submission.id, &req.expense_items, now)
            .await?;

        let updated = with_report(
            submission,
            req.income,
            notes,
            &expenses,
            SubmissionStatus::Draft,
            None,
            now,
        );

        self.db()
            .submissions()
            .replace_report(&updated, &expenses, SubmissionStatus::Draft)
            .await?;

        info!(submission_id = %updated.id, "Submission updated");

        Ok(SubmissionResponse {
            success: true,
            submission_id: updated.id,
            submission_code: updated.code,
            warnings: Vec::new(),
        })
    }

    /// Re-submits a bounced submission, optionally with corrections.
    ///
    /// The submission keeps its identity and batch id; only the status
    /// moves (resubmit → pending) and a fresh submitted-to-HQ timestamp is
    /// stamped.
    pub async fn resubmit_submission(
        &self,
        req: ResubmitSubmissionRequest,
    ) -> Result<SubmissionResponse, ApiError> {
        self.consume_token(&req.token)?;

        require("manager_id", &req.manager_id)?;
        require("submission_id", &req.submission_id)?;
        if let Some(income) = &req.income {
            validate_income(income)?;
        }
        if let Some(items) = &req.expense_items {
            validate_expense_items(items)?;
        }

        let submission = self.load_owned(&req.submission_id, &req.manager_id).await?;
        if submission.status != SubmissionStatus::Resubmit {
            return Err(status_error(&submission));
        }
        let next_status = submission
            .status
            .transition(SubmissionStatus::Pending)
            .map_err(ApiError::from)?;

        let now = Utc::now();
        let expenses = match &req.expense_items {
            Some(items) => self.build_expense_rows(&submission.id, items, now).await?,
            None => {
                self.db()
                    .expenses()
                    .list_for_submission(&submission.id)
                    .await?
            }
        };

        let income = req.income.unwrap_or_else(|| income_of(&submission));
        let notes = match req.notes.as_deref() {
            Some(raw) => validate_notes(Some(raw))?,
            None => submission.notes.clone(),
        };

        let updated = with_report(submission, income, notes, &expenses, next_status, Some(now), now);

        self.db()
            .submissions()
            .replace_report(&updated, &expenses, SubmissionStatus::Resubmit)
            .await?;

        info!(submission_id = %updated.id, "Submission re-submitted to HQ");

        Ok(SubmissionResponse {
            success: true,
            submission_id: updated.id,
            submission_code: updated.code,
            warnings: Vec::new(),
        })
    }

    /// Moves every draft of (manager, date) to pending as one batch.
    pub async fn submit_batch(
        &self,
        req: BatchSubmitRequest,
    ) -> Result<BatchSubmitResponse, ApiError> {
        self.consume_token(&req.token)?;

        require("manager_id", &req.manager_id)?;
        let report_date = validate_date("report_date", &req.report_date)?;

        let batch_id = Uuid::new_v4().to_string();
        let moved = self
            .db()
            .submissions()
            .submit_batch(&req.manager_id, report_date, &batch_id)
            .await?;

        if moved == 0 {
            return Err(CoreError::NothingToSubmit {
                manager_id: req.manager_id.clone(),
                report_date: report_date.to_string(),
            }
            .into());
        }

        info!(manager_id = %req.manager_id, batch_id = %batch_id, moved, "Batch submitted");

        Ok(BatchSubmitResponse {
            success: true,
            message: format!("Submitted {} to HQ", count_phrase(moved, "report")),
            batch_id,
            submitted_count: moved,
        })
    }

    /// Advisory duplicate probe for pre-submit UI warnings.
    pub async fn check_duplicate(
        &self,
        outlet_id: &str,
        report_date: &str,
    ) -> Result<DuplicateCheckResponse, ApiError> {
        require("outlet_id", outlet_id)?;
        let report_date = validate_date("report_date", report_date)?;

        let existing = self
            .db()
            .submissions()
            .find_by_outlet_date(outlet_id, report_date)
            .await?;

        Ok(DuplicateCheckResponse {
            exists: existing.is_some(),
            submission_id: existing.as_ref().map(|s| s.id.clone()),
            status: existing.map(|s| s.status),
        })
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Loads a submission and enforces ownership.
    async fn load_owned(
        &self,
        submission_id: &str,
        manager_id: &str,
    ) -> Result<Submission, ApiError> {
        let submission = self
            .db()
            .submissions()
            .get_by_id(submission_id)
            .await?
            .ok_or_else(|| CoreError::SubmissionNotFound(submission_id.to_string()))?;

        if submission.manager_id != manager_id {
            return Err(CoreError::NotOwner {
                submission_id: submission_id.to_string(),
                manager_id: manager_id.to_string(),
            }
            .into());
        }

        Ok(submission)
    }

    /// Builds the single uncategorized expense recorded at create time.
    async fn build_lump_expense(
        &self,
        submission_id: &str,
        amount_cents: i64,
        receipt: Option<&ReceiptUpload>,
        warnings: &mut Vec<String>,
        now: chrono::DateTime<Utc>,
    ) -> Result<Expense, ApiError> {
        let category = self
            .db()
            .expenses()
            .category_by_code(CategoryCode::Uncategorized)
            .await?
            .ok_or_else(|| ApiError::internal("Uncategorized expense category is not configured"))?;

        let receipts = match receipt {
            Some(upload) => match self.receipts().store(&upload.filename, &upload.content) {
                Ok(stored) => vec![stored],
                Err(err) => {
                    warn!(error = %err, "Receipt upload failed at create; recording without it");
                    warnings.push("receipts missing".to_string());
                    Vec::new()
                }
            },
            None => {
                warnings.push("receipts missing".to_string());
                Vec::new()
            }
        };

        Ok(Expense {
            id: Uuid::new_v4().to_string(),
            submission_id: submission_id.to_string(),
            category_id: category.id,
            amount_cents,
            description: "Daily expense total (pending itemization)".to_string(),
            receipts: Expense::encode_receipts(&receipts),
            status: ExpenseApprovalStatus::Pending,
            approver_id: None,
            rejection_reason: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builds the replacement expense rows for an update/resubmit payload.
    ///
    /// Items were already validated; here uploads are stored and any
    /// storage failure aborts before the transaction opens.
    async fn build_expense_rows(
        &self,
        submission_id: &str,
        items: &[ExpenseItemInput],
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<Expense>, ApiError> {
        let categories = self.db().expenses().list_categories().await?;
        let by_code: HashMap<CategoryCode, String> = categories
            .into_iter()
            .map(|category| (category.code, category.id))
            .collect();

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let category_id = by_code
                .get(&item.category)
                .cloned()
                .ok_or_else(|| ApiError::internal("Expense category is not configured"))?;

            let mut receipts = item.kept_receipts.clone();
            if let Some(upload) = &item.upload {
                let stored = self
                    .receipts()
                    .store(&upload.filename, &upload.content)
                    .map_err(|err| ApiError::new(ErrorCode::UploadFailed, err.to_string()))?;
                receipts.push(stored);
            }

            rows.push(Expense {
                id: Uuid::new_v4().to_string(),
                submission_id: submission_id.to_string(),
                category_id,
                amount_cents: item.amount_cents,
                description: item.description.trim().to_string(),
                receipts: Expense::encode_receipts(&receipts),
                status: ExpenseApprovalStatus::Pending,
                approver_id: None,
                rejection_reason: None,
                approved_at: None,
                created_at: now,
                updated_at: now,
            });
        }

        Ok(rows)
    }
}

// =============================================================================
// Free Helpers
// =============================================================================

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_income(income: &IncomeFigures) -> Result<(), ApiError> {
    validate_amount_cents("cash sales", income.cash_cents)?;
    validate_amount_cents("mp sales", income.mp_berhad_cents)?;
    validate_amount_cents("market sales", income.market_cents)?;
    validate_amount_cents("other sales", income.other_cents)?;
    Ok(())
}

/// Field rules plus the receipt-presence rule, all before any write.
fn validate_expense_items(items: &[ExpenseItemInput]) -> Result<(), ApiError> {
    for (index, item) in items.iter().enumerate() {
        validate_description(&item.description)?;
        validate_amount_cents("expense amount", item.amount_cents)?;
        if item.upload.is_none() && item.kept_receipts.is_empty() {
            return Err(ValidationError::ReceiptRequired { index }.into());
        }
    }
    Ok(())
}

fn duplicate_error(outlet_id: &str, report_date: NaiveDate) -> ApiError {
    CoreError::DuplicateSubmission {
        outlet_id: outlet_id.to_string(),
        report_date: report_date.to_string(),
    }
    .into()
}

fn status_error(submission: &Submission) -> ApiError {
    CoreError::InvalidSubmissionStatus {
        submission_id: submission.id.clone(),
        current_status: submission.status,
    }
    .into()
}

fn income_of(submission: &Submission) -> IncomeFigures {
    IncomeFigures {
        cash_cents: submission.cash_sales_cents,
        mp_berhad_cents: submission.mp_sales_cents,
        market_cents: submission.market_sales_cents,
        other_cents: submission.other_sales_cents,
    }
}

/// Applies replacement figures to a submission, recomputing the derived
/// totals from the expense set that will land in the same transaction.
fn with_report(
    mut submission: Submission,
    income: IncomeFigures,
    notes: Option<String>,
    expenses: &[Expense],
    status: SubmissionStatus,
    submitted_at: Option<chrono::DateTime<Utc>>,
    now: chrono::DateTime<Utc>,
) -> Submission {
    let total_income = income.total().cents();
    let total_expenses: i64 = expenses.iter().map(|e| e.amount_cents).sum();

    submission.cash_sales_cents = income.cash_cents;
    submission.mp_sales_cents = income.mp_berhad_cents;
    submission.market_sales_cents = income.market_cents;
    submission.other_sales_cents = income.other_cents;
    submission.total_income_cents = total_income;
    submission.total_expenses_cents = total_expenses;
    submission.net_amount_cents = total_income - total_expenses;
    submission.status = status;
    submission.notes = notes;
    submission.updated_at = now;
    if submitted_at.is_some() {
        submission.submitted_at = submitted_at;
    }
    submission
}

/// Generates a human-readable submission code: `CL-YYYYMMDD-ABC-NNNN`.
fn generate_submission_code(outlet: &Outlet, report_date: NaiveDate) -> String {
    let outlet_code: String = outlet
        .name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    // Timestamp-derived sequence; uniqueness is carried by the UUID id,
    // the code only needs to be readable on paper
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let seq = (nanos % 10000) as u16;

    format!("CL-{}-{}-{:04}", report_date.format("%Y%m%d"), outlet_code, seq)
}

// =============================================================================
// Unit Tests
// =============================================================================
