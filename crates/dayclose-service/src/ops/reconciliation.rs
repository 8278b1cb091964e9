//! # Reconciliation Operations
//!
//! The accountant pastes an external sales export; the pipeline ingests,
//! normalizes, snapshots and matches it against pending submissions.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw pasted text ──► ingest (delimiter detection, quoted fields)        │
//! │        or                                                               │
//! │  structured rows ──► JSON decode                                        │
//! │                         │                                               │
//! │                         ▼                                               │
//! │             normalize onto the stream schema                            │
//! │                         │                                               │
//! │                         ▼                                               │
//! │        snapshot replaced for the scope (delete + reinsert)              │
//! │                         │                                               │
//! │                         ▼                                               │
//! │        matcher over pending submissions (read-only)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::ClosingService;
use dayclose_core::{
    ingest, normalize::normalize_rows, reconcile::reconcile, NormalizedRow, PendingClaim,
    ReconciliationResult, SalesStream, SnapshotScope, Submission, SubmissionStatus,
    ValidationError,
};

// =============================================================================
// Request / Response DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshotRequest {
    pub token: String,
    pub accountant_id: String,
    pub scope: SnapshotScope,
    pub stream: SalesStream,
    /// Raw pasted export text; ignored when `structured_rows` is present.
    pub raw_text: Option<String>,
    /// Pre-structured row array, JSON-encoded (`[["A100","Jalan Ipoh",...],...]`).
    pub structured_rows: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub saved_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<SnapshotData>,
    /// Fresh one-time token for the next call.
    pub next_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub success: bool,
    pub results: Vec<ReconciliationResult>,
}

// =============================================================================
// Operations
// =============================================================================

impl ClosingService {
    /// Ingests and persists an external-sales snapshot for a scope.
    ///
    /// The scope's previous snapshot is replaced as a whole; a failure
    /// anywhere leaves it intact. Returns a fresh one-time token so the
    /// accountant can paste again immediately.
    pub async fn save_external_sales(
        &self,
        req: SaveSnapshotRequest,
    ) -> Result<SnapshotResponse, ApiError> {
        self.consume_token(&req.token)?;

        if req.accountant_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "accountant_id".to_string(),
            }
            .into());
        }

        let cells: Vec<Vec<String>> = match (&req.structured_rows, &req.raw_text) {
            (Some(json), _) => {
                serde_json::from_str(json).map_err(|err| ValidationError::InvalidFormat {
                    field: "structured_rows".to_string(),
                    reason: err.to_string(),
                })?
            }
            (None, Some(text)) => ingest::ingest(text),
            (None, None) => {
                return Err(ValidationError::Required {
                    field: "rows".to_string(),
                }
                .into())
            }
        };

        let normalized = normalize_rows(&cells, req.stream);

        let saved = self
            .db()
            .external_sales()
            .replace_snapshot(&req.scope, &normalized, &req.accountant_id)
            .await?;

        info!(scope = ?req.scope, stream = ?req.stream, saved, "Snapshot saved");

        Ok(SnapshotResponse {
            success: true,
            message: snapshot_message(saved),
            data: Some(SnapshotData { saved_rows: saved }),
            next_token: self.issue_token(),
        })
    }

    /// Runs the matcher for one scope and stream over the stored snapshot.
    ///
    /// Read-only: never mutates submissions or expenses.
    pub async fn reconcile_stream(
        &self,
        scope: &SnapshotScope,
        stream: SalesStream,
    ) -> Result<ReconcileResponse, ApiError> {
        let submissions: Vec<Submission> = match scope {
            SnapshotScope::Submission(id) => {
                self.db().submissions().get_by_id(id).await?.into_iter().collect()
            }
            SnapshotScope::Manager(id) => {
                self.db().submissions().list_pending_for_manager(id).await?
            }
        };

        let mut claims = Vec::new();
        for submission in submissions.iter().filter(|s| {
            s.status == SubmissionStatus::Pending && s.declared_for_stream(stream).is_positive()
        }) {
            let outlet = self
                .db()
                .outlets()
                .get_by_id(&submission.outlet_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Outlet", &submission.outlet_id))?;

            let submitted_expenses = self
                .db()
                .expenses()
                .sum_for_category(&submission.id, stream.claim_category())
                .await?;

            claims.push(PendingClaim {
                submission_id: submission.id.clone(),
                submission_code: submission.code.clone(),
                outlet_login: outlet.login_id,
                outlet_name: outlet.name,
                submitted_sales_cents: submission.declared_for_stream(stream).cents(),
                submitted_expenses_cents: submitted_expenses,
            });
        }

        let rows: Vec<NormalizedRow> = self
            .db()
            .external_sales()
            .list_for_scope(scope)
            .await?
            .iter()
            .map(|row| row.to_normalized())
            .collect();

        let results = reconcile(&claims, &rows, stream);

        Ok(ReconcileResponse {
            success: true,
            results,
        })
    }
}

/// Zero/one/many summary for snapshot saves.
fn snapshot_message(saved: usize) -> String {
    match saved {
        0 => "No rows saved".to_string(),
        1 => "Saved 1 row".to_string(),
        n => format!("Saved {n} rows"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::ops::submission::{BatchSubmitRequest, CreateSubmissionRequest};
    use crate::testing::service_with_outlets;
    use dayclose_core::{IncomeFigures, MatchStatus};

    #[test]
    fn test_snapshot_message_pluralization() {
        assert_eq!(snapshot_message(0), "No rows saved");
        assert_eq!(snapshot_message(1), "Saved 1 row");
        assert_eq!(snapshot_message(7), "Saved 7 rows");
    }

    /// Creates pending submissions for m1: o1 declaring 150.00 MP sales,
    /// o2 declaring 200.00.
    async fn seed_pending_batch(service: &ClosingService) -> (String, String) {
        let mut ids = Vec::new();
        for (outlet, mp) in [("o1", 15000), ("o2", 20000)] {
            let created = service
                .create_submission(CreateSubmissionRequest {
                    token: service.issue_token(),
                    manager_id: "m1".to_string(),
                    outlet_id: outlet.to_string(),
                    report_date: "2024-01-01".to_string(),
                    income: IncomeFigures {
                        cash_cents: 10000,
                        mp_berhad_cents: mp,
                        market_cents: 0,
                        other_cents: 0,
                    },
                    notes: None,
                    expense_total_cents: None,
                    receipt: None,
                })
                .await
                .unwrap();
            ids.push(created.submission_id);
        }

        service
            .submit_batch(BatchSubmitRequest {
                token: service.issue_token(),
                manager_id: "m1".to_string(),
                report_date: "2024-01-01".to_string(),
            })
            .await
            .unwrap();

        (ids.remove(0), ids.remove(0))
    }

    fn save_req(service: &ClosingService, raw: &str) -> SaveSnapshotRequest {
        SaveSnapshotRequest {
            token: service.issue_token(),
            accountant_id: "acct-1".to_string(),
            scope: SnapshotScope::Manager("m1".to_string()),
            stream: SalesStream::MpBerhad,
            raw_text: Some(raw.to_string()),
            structured_rows: None,
        }
    }

    #[tokio::test]
    async fn test_paste_to_reconcile_end_to_end() {
        let service = service_with_outlets().await;
        let (sub_o1, sub_o2) = seed_pending_batch(&service).await;

        // Tab-separated paste with a header echo; A100 matches exactly,
        // A101 is one ringgit short
        let paste = "Agent\tOutlet Name\tLevel\tTickets\tTotal Deposit\tTotal Withdraw\tCompany Sales\tCompany Profit\tCompany Payout\n\
                     A100\tJalan Ipoh\t3\t12\t150.00\t0.00\t\t\t\n\
                     A101\tSentul Utara\t2\t9\t199.00\t0.00\t\t\t\n";

        let saved = service.save_external_sales(save_req(&service, paste)).await.unwrap();
        assert!(saved.success);
        assert_eq!(saved.message, "Saved 2 rows");

        let response = service
            .reconcile_stream(&SnapshotScope::Manager("m1".to_string()), SalesStream::MpBerhad)
            .await
            .unwrap();
        assert_eq!(response.results.len(), 2);

        let by_id = |id: &str| {
            response
                .results
                .iter()
                .find(|r| r.submission_id == id)
                .unwrap()
        };

        let first = by_id(&sub_o1);
        assert_eq!(first.status, MatchStatus::Match);
        assert_eq!(first.external_sales_cents, 15000);
        assert_eq!(first.sales_difference_cents, 0);

        let second = by_id(&sub_o2);
        assert_eq!(second.status, MatchStatus::Mismatch);
        assert_eq!(second.sales_difference_cents, -100);
    }

    #[tokio::test]
    async fn test_reconcile_not_found_when_login_absent() {
        let service = service_with_outlets().await;
        let (sub_o1, _) = seed_pending_batch(&service).await;

        let paste = "Z999\tSomewhere Else\t1\t1\t5.00\t0.00\t\t\t";
        service.save_external_sales(save_req(&service, paste)).await.unwrap();

        let response = service
            .reconcile_stream(&SnapshotScope::Manager("m1".to_string()), SalesStream::MpBerhad)
            .await
            .unwrap();

        let first = response
            .results
            .iter()
            .find(|r| r.submission_id == sub_o1)
            .unwrap();
        assert_eq!(first.status, MatchStatus::NotFound);
        assert_eq!(first.sales_difference_cents, -15000);
    }

    #[tokio::test]
    async fn test_structured_rows_path() {
        let service = service_with_outlets().await;
        seed_pending_batch(&service).await;

        let mut req = save_req(&service, "");
        req.raw_text = None;
        req.structured_rows = Some(
            r#"[["A100","Jalan Ipoh","3","12","150.00","0.00","","",""]]"#.to_string(),
        );

        let response = service.save_external_sales(req).await.unwrap();
        assert_eq!(response.message, "Saved 1 row");

        let rows = service
            .db()
            .external_sales()
            .list_for_scope(&SnapshotScope::Manager("m1".to_string()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].login_id, "A100");
        assert_eq!(rows[0].total_deposit, "150.00");
    }

    #[tokio::test]
    async fn test_malformed_structured_rows_rejected_before_write() {
        let service = service_with_outlets().await;
        seed_pending_batch(&service).await;

        // Establish a snapshot first
        service
            .save_external_sales(save_req(&service, "A100\tJalan Ipoh\t3\t1\t1.00\t0\t\t\t"))
            .await
            .unwrap();

        let mut req = save_req(&service, "");
        req.raw_text = None;
        req.structured_rows = Some("not valid json".to_string());
        let err = service.save_external_sales(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Previous snapshot untouched
        let rows = service
            .db()
            .external_sales()
            .list_for_scope(&SnapshotScope::Manager("m1".to_string()))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_unknown_scope_rejected() {
        let service = service_with_outlets().await;
        let mut req = save_req(&service, "A100\t1.00");
        req.scope = SnapshotScope::Submission("no-such-submission".to_string());
        let err = service.save_external_sales(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_next_token_chains_saves() {
        let service = service_with_outlets().await;
        seed_pending_batch(&service).await;

        let first = service
            .save_external_sales(save_req(&service, "A100\tJalan Ipoh\t3\t1\t1.00\t0\t\t\t"))
            .await
            .unwrap();

        let mut second = save_req(&service, "A101\tSentul Utara\t2\t1\t2.00\t0\t\t\t");
        second.token = first.next_token;
        assert!(service.save_external_sales(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_submission_scope_reconcile() {
        let service = service_with_outlets().await;
        let (sub_o1, _) = seed_pending_batch(&service).await;

        let mut req = save_req(&service, "A100\tJalan Ipoh\t3\t12\t150.00\t0.00\t\t\t");
        req.scope = SnapshotScope::Submission(sub_o1.clone());
        service.save_external_sales(req).await.unwrap();

        let response = service
            .reconcile_stream(&SnapshotScope::Submission(sub_o1.clone()), SalesStream::MpBerhad)
            .await
            .unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].status, MatchStatus::Match);
        assert_eq!(response.results[0].submission_id, sub_o1);
    }

    #[tokio::test]
    async fn test_reconcile_skips_zero_declared_streams() {
        let service = service_with_outlets().await;
        // Declares cash only; MP stream amount is zero
        service
            .create_submission(CreateSubmissionRequest {
                token: service.issue_token(),
                manager_id: "m1".to_string(),
                outlet_id: "o1".to_string(),
                report_date: "2024-01-01".to_string(),
                income: IncomeFigures {
                    cash_cents: 10000,
                    mp_berhad_cents: 0,
                    market_cents: 0,
                    other_cents: 0,
                },
                notes: None,
                expense_total_cents: None,
                receipt: None,
            })
            .await
            .unwrap();
        service
            .submit_batch(BatchSubmitRequest {
                token: service.issue_token(),
                manager_id: "m1".to_string(),
                report_date: "2024-01-01".to_string(),
            })
            .await
            .unwrap();

        let response = service
            .reconcile_stream(&SnapshotScope::Manager("m1".to_string()), SalesStream::MpBerhad)
            .await
            .unwrap();
        assert!(response.results.is_empty());
    }
}
