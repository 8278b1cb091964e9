//! # Sales Stream Configuration
//!
//! Each reconciliation flow runs against one sales stream. A stream fixes
//! everything format-specific about the external export: column order and
//! width, the header labels to recognize and discard, which column is the
//! join key, which columns aggregate into external sales and external
//! expenses, and which expense category backs the submitted-expense total.
//!
//! All of this is resolved once, here, as enum data. Operations dispatch on
//! [`SalesStream`] values, never on category name strings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::CategoryCode;

// =============================================================================
// External Fields
// =============================================================================

/// The canonical fields an external sales row can carry.
///
/// Not every stream's export has all nine columns; the stream's
/// [`column_layout`](SalesStream::column_layout) says which cells map to
/// which fields, and unmapped fields stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExternalField {
    LoginId,
    OutletName,
    Level,
    TicketCount,
    TotalDeposit,
    TotalWithdraw,
    CompanySales,
    CompanyProfit,
    CompanyPayout,
}

// =============================================================================
// Join Key
// =============================================================================

/// How external rows are joined to pending submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    /// Exact match on the outlet's external login id.
    LoginId,
    /// Case-insensitive exact match on the outlet name.
    OutletName,
}

// =============================================================================
// Sales Stream
// =============================================================================

/// The sales streams this system reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SalesStream {
    /// MP Berhad platform export: nine columns, joined by login id.
    MpBerhad,
    /// Market export: eight columns (no level), joined by outlet name.
    Market,
}

impl SalesStream {
    /// The export's column order for this stream.
    pub fn column_layout(self) -> &'static [ExternalField] {
        use ExternalField::*;
        match self {
            SalesStream::MpBerhad => &[
                LoginId,
                OutletName,
                Level,
                TicketCount,
                TotalDeposit,
                TotalWithdraw,
                CompanySales,
                CompanyProfit,
                CompanyPayout,
            ],
            SalesStream::Market => &[
                LoginId,
                OutletName,
                TicketCount,
                CompanySales,
                CompanyProfit,
                CompanyPayout,
                TotalDeposit,
                TotalWithdraw,
            ],
        }
    }

    /// Number of columns the export is expected to have.
    pub fn expected_width(self) -> usize {
        self.column_layout().len()
    }

    /// Lower-case header labels, in column order.
    ///
    /// A pasted row whose trimmed, lower-cased cells equal this sequence is
    /// a header echo and gets dropped by the normalizer.
    pub fn header_labels(self) -> &'static [&'static str] {
        match self {
            SalesStream::MpBerhad => &[
                "agent",
                "outlet name",
                "level",
                "tickets",
                "total deposit",
                "total withdraw",
                "company sales",
                "company profit",
                "company payout",
            ],
            SalesStream::Market => &[
                "agent",
                "outlet name",
                "tickets",
                "company sales",
                "company profit",
                "company payout",
                "total deposit",
                "total withdraw",
            ],
        }
    }

    /// How this stream's rows join to submissions.
    pub fn join_key(self) -> JoinKey {
        match self {
            SalesStream::MpBerhad => JoinKey::LoginId,
            SalesStream::Market => JoinKey::OutletName,
        }
    }

    /// The fields summed into the external sales figure.
    pub fn sales_fields(self) -> &'static [ExternalField] {
        match self {
            SalesStream::MpBerhad => &[ExternalField::TotalDeposit],
            SalesStream::Market => &[ExternalField::CompanySales, ExternalField::CompanyProfit],
        }
    }

    /// The fields summed into the external expenses figure.
    pub fn expense_fields(self) -> &'static [ExternalField] {
        match self {
            SalesStream::MpBerhad => &[ExternalField::TotalWithdraw],
            SalesStream::Market => &[ExternalField::CompanyPayout],
        }
    }

    /// The expense category whose entries form the submitted expense total
    /// compared against this stream's external expenses.
    pub fn claim_category(self) -> CategoryCode {
        match self {
            SalesStream::MpBerhad => CategoryCode::MpBerhad,
            SalesStream::Market => CategoryCode::Market,
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
    fn test_layout_and_headers_agree() {
        for stream in [SalesStream::MpBerhad, SalesStream::Market] {
            assert_eq!(
                stream.column_layout().len(),
                stream.header_labels().len(),
                "{stream:?} layout/header mismatch"
            );
            assert_eq!(stream.expected_width(), stream.column_layout().len());
        }
    }

    #[test]
    fn test_mp_berhad_configuration() {
        let stream = SalesStream::MpBerhad;
        assert_eq!(stream.expected_width(), 9);
        assert_eq!(stream.join_key(), JoinKey::LoginId);
        assert_eq!(stream.sales_fields(), &[ExternalField::TotalDeposit]);
        assert_eq!(stream.expense_fields(), &[ExternalField::TotalWithdraw]);
        assert_eq!(stream.claim_category(), CategoryCode::MpBerhad);
    }

    #[test]
    fn test_market_configuration() {
        let stream = SalesStream::Market;
        assert_eq!(stream.expected_width(), 8);
        assert_eq!(stream.join_key(), JoinKey::OutletName);
        assert_eq!(
            stream.sales_fields(),
            &[ExternalField::CompanySales, ExternalField::CompanyProfit]
        );
        assert_eq!(stream.expense_fields(), &[ExternalField::CompanyPayout]);
        assert_eq!(stream.claim_category(), CategoryCode::Market);
    }
}
