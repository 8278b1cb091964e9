//! # Expense Approval Operations
//!
//! The accountant's bulk sub-flow over one pending submission's
//! uncategorized expenses: approve them in place, or reject them and
//! bounce the submission back to its manager.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ApiError;
use crate::ops::count_phrase;
use crate::ClosingService;
use dayclose_core::validation::validate_reason;
use dayclose_core::{
    AccountantNote, CoreError, Submission, SubmissionStatus, ValidationError,
};

// =============================================================================
// Request / Response DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApproveExpensesRequest {
    pub token: String,
    pub accountant_id: String,
    pub submission_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RejectExpensesRequest {
    pub token: String,
    pub accountant_id: String,
    pub submission_id: String,
    /// Why the submission is going back; required, non-empty.
    pub reason: String,
}

/// `{success, message, submission_code}` per the approval contract.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub success: bool,
    pub message: String,
    pub submission_code: String,
    /// How many expense rows changed.
    pub changed: u64,
}

// =============================================================================
// Operations
// =============================================================================

impl ClosingService {
    /// Approves every uncategorized expense of a pending submission.
    ///
    /// The submission itself stays `pending`; nothing here finalizes it.
    pub async fn approve_expenses(
        &self,
        req: ApproveExpensesRequest,
    ) -> Result<ApprovalResponse, ApiError> {
        self.consume_token(&req.token)?;
        require_actor(&req.accountant_id)?;

        let submission = self.load_pending(&req.submission_id).await?;

        let changed = self
            .db()
            .expenses()
            .approve_uncategorized(&submission.id, &req.accountant_id)
            .await?;

        info!(
            submission_id = %submission.id,
            accountant_id = %req.accountant_id,
            changed,
            "Expenses approved"
        );

        Ok(ApprovalResponse {
            success: true,
            message: format!("Approved {}", count_phrase(changed, "expense")),
            submission_code: submission.code,
            changed,
        })
    }

    /// Rejects a pending submission's uncategorized expenses and bounces
    /// it back to the manager, in one transaction.
    pub async fn reject_expenses(
        &self,
        req: RejectExpensesRequest,
    ) -> Result<ApprovalResponse, ApiError> {
        self.consume_token(&req.token)?;
        require_actor(&req.accountant_id)?;
        // Validated before anything opens a transaction
        let reason = validate_reason(&req.reason)?;

        let submission = self.load_pending(&req.submission_id).await?;

        let note = AccountantNote {
            id: Uuid::new_v4().to_string(),
            submission_id: submission.id.clone(),
            author_id: req.accountant_id.clone(),
            message: format!("Returned to manager: {reason}"),
            created_at: chrono::Utc::now(),
        };

        let changed = self
            .db()
            .expenses()
            .reject_uncategorized(&submission.id, &reason, &req.accountant_id, &note)
            .await?;

        info!(
            submission_id = %submission.id,
            accountant_id = %req.accountant_id,
            changed,
            "Expenses rejected, submission bounced"
        );

        Ok(ApprovalResponse {
            success: true,
            message: format!(
                "Rejected {}, submission returned to manager",
                count_phrase(changed, "expense")
            ),
            submission_code: submission.code,
            changed,
        })
    }

    /// Loads a submission and requires it to be pending.
    async fn load_pending(&self, submission_id: &str) -> Result<Submission, ApiError> {
        let submission = self
            .db()
            .submissions()
            .get_by_id(submission_id)
            .await?
            .ok_or_else(|| CoreError::SubmissionNotFound(submission_id.to_string()))?;

        if submission.status != SubmissionStatus::Pending {
            return Err(CoreError::InvalidSubmissionStatus {
                submission_id: submission.id.clone(),
                current_status: submission.status,
            }
            .into());
        }

        Ok(submission)
    }
}

fn require_actor(accountant_id: &str) -> Result<(), ApiError> {
    if accountant_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "accountant_id".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
