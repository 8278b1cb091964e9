//! # Operations
//!
//! The externally callable operations, grouped by workflow:
//!
//! - [`submission`] - Create/update/resubmit, the advisory duplicate check,
//!   and the atomic batch submit to HQ
//! - [`approval`] - The accountant's bulk expense approve/reject sub-flow
//! - [`reconciliation`] - Saving external-sales snapshots and running the
//!   matcher over them
//!
//! Every request DTO carrying a `token` field is a mutating operation; the
//! token is consumed first, validation runs second, and only then does a
//! transaction open.

pub mod approval;
pub mod reconciliation;
pub mod submission;

/// "no rows" / "1 row" / "7 rows" — shared by human-readable summaries.
pub(crate) fn count_phrase(count: u64, noun: &str) -> String {
    match count {
        0 => format!("no {noun}s"),
        1 => format!("1 {noun}"),
        n => format!("{n} {noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_phrase() {
        assert_eq!(count_phrase(0, "row"), "no rows");
        assert_eq!(count_phrase(1, "row"), "1 row");
        assert_eq!(count_phrase(12, "row"), "12 rows");
    }
}
