//! # Reconciliation Matcher
//!
//! Joins normalized external rows to pending submissions and compares the
//! declared figures against the export, within tolerance.
//!
//! ## Matching Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pending claims                normalized external rows                 │
//! │       │                              │                                  │
//! │       │                              ▼                                  │
//! │       │                   lookup keyed by join key                      │
//! │       │                   (login id exact, or outlet name lowercased)   │
//! │       ▼                              │                                  │
//! │  per claim ──────────────────────────┘                                  │
//! │       │                                                                 │
//! │       ├── no rows under key → not_found                                 │
//! │       │     (external figures zero, differences = −submitted)           │
//! │       │                                                                 │
//! │       └── sum designated sales / expense columns over matched rows      │
//! │             difference = external − submitted                           │
//! │             match  iff  |sales diff| ≤ 1¢  AND  |expense diff| ≤ 1¢     │
//! │             else mismatch                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The matcher is read-only analysis: it never mutates submission or
//! expense state, whether it runs over a just-ingested paste or a stored
//! snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::amount::parse_amount;
use crate::money::Money;
use crate::normalize::NormalizedRow;
use crate::stream::{ExternalField, JoinKey, SalesStream};
use crate::RECON_TOLERANCE;

// =============================================================================
// Inputs
// =============================================================================

/// One pending submission's reconciliation-relevant slice.
///
/// The submitted expense total is the sum of the submission's expense
/// entries in the stream's claim category, computed by the caller from
/// persisted Expense rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PendingClaim {
    pub submission_id: String,
    pub submission_code: String,
    /// Outlet's external login id, if it has one.
    pub outlet_login: Option<String>,
    pub outlet_name: String,
    pub submitted_sales_cents: i64,
    pub submitted_expenses_cents: i64,
}

// =============================================================================
// Results
// =============================================================================

/// Outcome classification for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Both differences within tolerance.
    Match,
    /// External rows found but at least one difference exceeds tolerance.
    Mismatch,
    /// No external rows share this submission's key.
    NotFound,
}

/// Per-submission comparison of submitted vs. external figures.
///
/// Derived data; never persisted as its own table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconciliationResult {
    pub submission_id: String,
    pub submission_code: String,
    pub status: MatchStatus,

    pub submitted_sales_cents: i64,
    pub external_sales_cents: i64,
    /// external − submitted
    pub sales_difference_cents: i64,

    pub submitted_expenses_cents: i64,
    pub external_expenses_cents: i64,
    /// external − submitted
    pub expenses_difference_cents: i64,

    /// How many external rows aggregated into this result.
    pub matched_rows: usize,
}

// =============================================================================
// Matching
// =============================================================================

/// Reconciles pending claims against normalized external rows.
///
/// Produces exactly one result per claim, in claim order.
pub fn reconcile(
    claims: &[PendingClaim],
    rows: &[NormalizedRow],
    stream: SalesStream,
) -> Vec<ReconciliationResult> {
    let lookup = build_lookup(rows, stream.join_key());

    claims
        .iter()
        .map(|claim| reconcile_claim(claim, &lookup, stream))
        .collect()
}

/// Groups external rows by join key. Rows with an empty key can never
/// match and are left out.
fn build_lookup<'a>(
    rows: &'a [NormalizedRow],
    join_key: JoinKey,
) -> HashMap<String, Vec<&'a NormalizedRow>> {
    let mut lookup: HashMap<String, Vec<&NormalizedRow>> = HashMap::new();
    for row in rows {
        let key = row_key(row, join_key);
        if key.is_empty() {
            continue;
        }
        lookup.entry(key).or_default().push(row);
    }
    lookup
}

fn row_key(row: &NormalizedRow, join_key: JoinKey) -> String {
    match join_key {
        JoinKey::LoginId => row.login_id.trim().to_string(),
        JoinKey::OutletName => row.outlet_name.trim().to_lowercase(),
    }
}

fn claim_key(claim: &PendingClaim, join_key: JoinKey) -> Option<String> {
    match join_key {
        JoinKey::LoginId => claim
            .outlet_login
            .as_deref()
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .map(str::to_string),
        JoinKey::OutletName => {
            let name = claim.outlet_name.trim().to_lowercase();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }
}

fn reconcile_claim(
    claim: &PendingClaim,
    lookup: &HashMap<String, Vec<&NormalizedRow>>,
    stream: SalesStream,
) -> ReconciliationResult {
    let submitted_sales = Money::from_cents(claim.submitted_sales_cents);
    let submitted_expenses = Money::from_cents(claim.submitted_expenses_cents);

    let matched = claim_key(claim, stream.join_key())
        .and_then(|key| lookup.get(&key))
        .map(|rows| rows.as_slice())
        .unwrap_or(&[]);

    if matched.is_empty() {
        // No external evidence at all: both differences are the negatives
        // of what the manager declared
        return ReconciliationResult {
            submission_id: claim.submission_id.clone(),
            submission_code: claim.submission_code.clone(),
            status: MatchStatus::NotFound,
            submitted_sales_cents: submitted_sales.cents(),
            external_sales_cents: 0,
            sales_difference_cents: (-submitted_sales).cents(),
            submitted_expenses_cents: submitted_expenses.cents(),
            external_expenses_cents: 0,
            expenses_difference_cents: (-submitted_expenses).cents(),
            matched_rows: 0,
        };
    }

    let external_sales = sum_fields(matched, stream.sales_fields());
    let external_expenses = sum_fields(matched, stream.expense_fields());

    let sales_difference = external_sales - submitted_sales;
    let expenses_difference = external_expenses - submitted_expenses;

    let status = if external_sales.within_tolerance_of(submitted_sales, RECON_TOLERANCE)
        && external_expenses.within_tolerance_of(submitted_expenses, RECON_TOLERANCE)
    {
        MatchStatus::Match
    } else {
        MatchStatus::Mismatch
    };

    ReconciliationResult {
        submission_id: claim.submission_id.clone(),
        submission_code: claim.submission_code.clone(),
        status,
        submitted_sales_cents: submitted_sales.cents(),
        external_sales_cents: external_sales.cents(),
        sales_difference_cents: sales_difference.cents(),
        submitted_expenses_cents: submitted_expenses.cents(),
        external_expenses_cents: external_expenses.cents(),
        expenses_difference_cents: expenses_difference.cents(),
        matched_rows: matched.len(),
    }
}

fn sum_fields(rows: &[&NormalizedRow], fields: &[ExternalField]) -> Money {
    rows.iter()
        .flat_map(|row| fields.iter().map(|field| parse_amount(row.field(*field))))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(login: &str, name: &str, sales: i64, expenses: i64) -> PendingClaim {
        PendingClaim {
            submission_id: format!("sub-{login}{name}"),
            submission_code: format!("CL-{login}{name}"),
            outlet_login: if login.is_empty() {
                None
            } else {
                Some(login.to_string())
            },
            outlet_name: name.to_string(),
            submitted_sales_cents: sales,
            submitted_expenses_cents: expenses,
        }
    }

    fn mp_row(login: &str, deposit: &str, withdraw: &str) -> NormalizedRow {
        NormalizedRow {
            login_id: login.to_string(),
            total_deposit: deposit.to_string(),
            total_withdraw: withdraw.to_string(),
            ..NormalizedRow::default()
        }
    }

    #[test]
    fn test_match_within_tolerance() {
        let claims = vec![claim("A100", "Jalan Ipoh", 10000, 0)];
        let rows = vec![mp_row("A100", "100.004", "0")];
        let results = reconcile(&claims, &rows, SalesStream::MpBerhad);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, MatchStatus::Match);
        assert_eq!(results[0].matched_rows, 1);
    }

    #[test]
    fn test_mismatch_beyond_tolerance() {
        let claims = vec![claim("A100", "Jalan Ipoh", 10000, 0)];
        let rows = vec![mp_row("A100", "100.02", "0")];
        let results = reconcile(&claims, &rows, SalesStream::MpBerhad);
        assert_eq!(results[0].status, MatchStatus::Mismatch);
        assert_eq!(results[0].sales_difference_cents, 2);
    }

    #[test]
    fn test_not_found() {
        let claims = vec![claim("A100", "Jalan Ipoh", 10000, 2500)];
        let rows = vec![mp_row("B200", "100.00", "0")];
        let results = reconcile(&claims, &rows, SalesStream::MpBerhad);
        assert_eq!(results[0].status, MatchStatus::NotFound);
        assert_eq!(results[0].external_sales_cents, 0);
        assert_eq!(results[0].sales_difference_cents, -10000);
        assert_eq!(results[0].expenses_difference_cents, -2500);
        assert_eq!(results[0].matched_rows, 0);
    }

    #[test]
    fn test_multiple_rows_aggregate() {
        let claims = vec![claim("A100", "Jalan Ipoh", 30000, 5000)];
        let rows = vec![
            mp_row("A100", "100.00", "25.00"),
            mp_row("A100", "200.00", "25.00"),
        ];
        let results = reconcile(&claims, &rows, SalesStream::MpBerhad);
        assert_eq!(results[0].status, MatchStatus::Match);
        assert_eq!(results[0].external_sales_cents, 30000);
        assert_eq!(results[0].external_expenses_cents, 5000);
        assert_eq!(results[0].matched_rows, 2);
    }

    #[test]
    fn test_name_join_is_case_insensitive() {
        let claims = vec![claim("", "Jalan Ipoh", 95000, 80000)];
        let rows = vec![NormalizedRow {
            outlet_name: "JALAN IPOH".to_string(),
            company_sales: "900.00".to_string(),
            company_profit: "50.00".to_string(),
            company_payout: "800.00".to_string(),
            ..NormalizedRow::default()
        }];
        let results = reconcile(&claims, &rows, SalesStream::Market);
        assert_eq!(results[0].status, MatchStatus::Match);
        assert_eq!(results[0].external_sales_cents, 95000);
        assert_eq!(results[0].external_expenses_cents, 80000);
    }

    #[test]
    fn test_expense_mismatch_alone_fails() {
        let claims = vec![claim("A100", "Jalan Ipoh", 10000, 1000)];
        let rows = vec![mp_row("A100", "100.00", "15.00")];
        let results = reconcile(&claims, &rows, SalesStream::MpBerhad);
        assert_eq!(results[0].status, MatchStatus::Mismatch);
        assert_eq!(results[0].expenses_difference_cents, 500);
    }

    #[test]
    fn test_claim_without_login_is_not_found_on_login_streams() {
        let claims = vec![claim("", "Jalan Ipoh", 10000, 0)];
        let rows = vec![mp_row("", "100.00", "0")];
        let results = reconcile(&claims, &rows, SalesStream::MpBerhad);
        assert_eq!(results[0].status, MatchStatus::NotFound);
    }
}
