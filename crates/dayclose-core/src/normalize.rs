//! # Row Normalizer
//!
//! Maps ingested rows onto a sales stream's fixed external-sales schema,
//! dropping noise rows and sanitizing every cell.
//!
//! ## Per-Row Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ingested row (N cells)                                                 │
//! │       │  truncate / right-pad with empty cells to the stream width      │
//! │       ▼                                                                 │
//! │  header echo?   lower-cased cells == stream header labels  → drop       │
//! │  blank row?     every cell empty after trimming            → drop       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sanitize each cell (trim, cap length), tag with original row index     │
//! │       ▼                                                                 │
//! │  NormalizedRow                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The original row index survives normalization so a stored snapshot can
//! be re-displayed, and deleted/reinserted, in paste order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stream::{ExternalField, SalesStream};
use crate::MAX_FIELD_LEN;

// =============================================================================
// Normalized Row
// =============================================================================

/// One external sales row after normalization, before persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NormalizedRow {
    /// Index of the row in the ingested sequence (paste order).
    pub row_index: usize,

    pub login_id: String,
    pub outlet_name: String,
    pub level: String,
    pub ticket_count: String,
    pub total_deposit: String,
    pub total_withdraw: String,
    pub company_sales: String,
    pub company_profit: String,
    pub company_payout: String,
}

impl NormalizedRow {
    /// Reads one canonical field.
    pub fn field(&self, field: ExternalField) -> &str {
        match field {
            ExternalField::LoginId => &self.login_id,
            ExternalField::OutletName => &self.outlet_name,
            ExternalField::Level => &self.level,
            ExternalField::TicketCount => &self.ticket_count,
            ExternalField::TotalDeposit => &self.total_deposit,
            ExternalField::TotalWithdraw => &self.total_withdraw,
            ExternalField::CompanySales => &self.company_sales,
            ExternalField::CompanyProfit => &self.company_profit,
            ExternalField::CompanyPayout => &self.company_payout,
        }
    }

    fn set_field(&mut self, field: ExternalField, value: String) {
        match field {
            ExternalField::LoginId => self.login_id = value,
            ExternalField::OutletName => self.outlet_name = value,
            ExternalField::Level => self.level = value,
            ExternalField::TicketCount => self.ticket_count = value,
            ExternalField::TotalDeposit => self.total_deposit = value,
            ExternalField::TotalWithdraw => self.total_withdraw = value,
            ExternalField::CompanySales => self.company_sales = value,
            ExternalField::CompanyProfit => self.company_profit = value,
            ExternalField::CompanyPayout => self.company_payout = value,
        }
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes ingested rows onto `stream`'s schema.
///
/// Header echoes and fully blank rows are dropped; everything else becomes
/// a [`NormalizedRow`] tagged with its index in the ingested sequence.
pub fn normalize_rows(rows: &[Vec<String>], stream: SalesStream) -> Vec<NormalizedRow> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, cells)| normalize_row(index, cells, stream))
        .collect()
}

/// Normalizes a single ingested row; None means the row was noise.
fn normalize_row(index: usize, cells: &[String], stream: SalesStream) -> Option<NormalizedRow> {
    let width = stream.expected_width();

    // Truncate or right-pad to the schema width, trimming as we go
    let mut fitted: Vec<String> = cells
        .iter()
        .take(width)
        .map(|cell| cell.trim().to_string())
        .collect();
    fitted.resize(width, String::new());

    // Header echo: the export's own column labels pasted along with the data
    let is_header = fitted
        .iter()
        .zip(stream.header_labels())
        .all(|(cell, label)| cell.to_lowercase() == *label);
    if is_header {
        return None;
    }

    // Blank row
    if fitted.iter().all(|cell| cell.is_empty()) {
        return None;
    }

    let mut row = NormalizedRow {
        row_index: index,
        ..NormalizedRow::default()
    };
    for (cell, field) in fitted.into_iter().zip(stream.column_layout()) {
        row.set_field(*field, sanitize(cell));
    }
    Some(row)
}

/// Trims and caps a cell value.
fn sanitize(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() > MAX_FIELD_LEN {
        trimmed.chars().take(MAX_FIELD_LEN).collect()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
