//! # Tabular Ingestion
//!
//! Turns a block of pasted free text of unknown structure into an ordered
//! sequence of rows of trimmed string cells. No semantic interpretation of
//! columns happens here; that is the row normalizer's job.
//!
//! ## Detection Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pasted text                                                            │
//! │       │  drop blank lines                                               │
//! │       ▼                                                                 │
//! │  For each candidate delimiter (tab, comma, semicolon, pipe):            │
//! │    average column count over ONLY the lines containing the candidate    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Highest average wins; candidate priority order breaks ties.            │
//! │  No candidate anywhere → split on runs of whitespace.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Spreadsheet pastes arrive tab-separated, exports arrive as CSV or
//! semicolon/pipe dumps, and ad hoc terminal copies arrive space-aligned;
//! the averaging step picks whichever candidate actually structures the
//! text instead of trusting the first separator it sees.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Delimiter
// =============================================================================

/// Candidate cell separators, in tie-breaking priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    Pipe,
    /// Fallback: any run of whitespace separates cells.
    Whitespace,
}

impl Delimiter {
    /// The literal separator character, or None for the whitespace fallback.
    pub fn as_char(self) -> Option<char> {
        match self {
            Delimiter::Tab => Some('\t'),
            Delimiter::Comma => Some(','),
            Delimiter::Semicolon => Some(';'),
            Delimiter::Pipe => Some('|'),
            Delimiter::Whitespace => None,
        }
    }
}

/// Candidates in fixed priority order; first wins a tied score.
const CANDIDATES: [Delimiter; 4] = [
    Delimiter::Tab,
    Delimiter::Comma,
    Delimiter::Semicolon,
    Delimiter::Pipe,
];

// =============================================================================
// Detection
// =============================================================================

/// Picks the delimiter that best structures the pasted text.
///
/// For each candidate, the score is the average number of columns across
/// only the lines that contain the candidate at least once. The highest
/// score wins; candidates are tried in priority order so a tie resolves to
/// the earlier one. Text containing no candidate at all falls back to
/// whitespace splitting.
pub fn detect_delimiter(text: &str) -> Delimiter {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut best: Option<(Delimiter, f64)> = None;
    for candidate in CANDIDATES {
        let ch = match candidate.as_char() {
            Some(c) => c,
            None => continue,
        };
        let column_counts: Vec<usize> = lines
            .iter()
            .filter(|line| line.contains(ch))
            .map(|line| split_delimited(line, ch).len())
            .collect();
        if column_counts.is_empty() {
            continue;
        }
        let average = column_counts.iter().sum::<usize>() as f64 / column_counts.len() as f64;
        // Strictly greater keeps the earlier candidate on ties
        if best.map(|(_, score)| average > score).unwrap_or(true) {
            best = Some((candidate, average));
        }
    }

    best.map(|(delimiter, _)| delimiter)
        .unwrap_or(Delimiter::Whitespace)
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses pasted text into rows of trimmed cells, detecting the delimiter.
///
/// Blank lines are dropped before parsing.
pub fn ingest(text: &str) -> Vec<Vec<String>> {
    let delimiter = detect_delimiter(text);
    ingest_with(text, delimiter)
}

/// Parses pasted text with a known delimiter.
pub fn ingest_with(text: &str, delimiter: Delimiter) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match delimiter.as_char() {
            Some(ch) => split_delimited(line, ch),
            None => line.split_whitespace().map(str::to_string).collect(),
        })
        .collect()
}

/// Splits one line on a delimiter, honoring quoted fields.
///
/// A field may be wrapped in double quotes; inside quotes the delimiter is
/// literal text and a doubled quote (`""`) is one embedded quote character.
fn split_delimited(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            cells.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    cells.push(current.trim().to_string());

    cells
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_tab() {
        let text = "a\tb\tc\nd\te\tf";
        assert_eq!(detect_delimiter(text), Delimiter::Tab);
    }

    #[test]
    fn test_detect_comma() {
        let text = "a,b,c\nd,e,f";
        assert_eq!(detect_delimiter(text), Delimiter::Comma);
    }

    #[test]
    fn test_detect_prefers_higher_average() {
        // Commas structure every line into 4 columns; the lone semicolon
        // line only reaches 2
        let text = "a,b,c,d\ne,f,g,h\nx;y";
        assert_eq!(detect_delimiter(text), Delimiter::Comma);
    }

    #[test]
    fn test_tie_resolves_by_priority() {
        // Tab and comma both average 3 columns; tab has priority
        let text = "a\tb\tc\nd,e,f";
        assert_eq!(detect_delimiter(text), Delimiter::Tab);
    }

    #[test]
    fn test_whitespace_fallback() {
        let text = "a b c\nd  e\tno wait there was a tab";
        // Tab appears, so no fallback here
        assert_eq!(detect_delimiter(text), Delimiter::Tab);

        let text = "a b c\nd  e   f";
        assert_eq!(detect_delimiter(text), Delimiter::Whitespace);
    }

    #[test]
    fn test_ingest_drops_blank_lines() {
        let rows = ingest("a\tb\n\n   \nc\td\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_ingest_trims_cells() {
        let rows = ingest_with("  a , b ,c ", Delimiter::Comma);
        assert_eq!(rows, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_quoted_delimiter_is_literal() {
        let rows = ingest_with(r#""Kuala Lumpur, Central",100,200"#, Delimiter::Comma);
        assert_eq!(rows, vec![vec!["Kuala Lumpur, Central", "100", "200"]]);
    }

    #[test]
    fn test_doubled_quote_is_escaped() {
        let rows = ingest_with(r#""say ""hi""",x"#, Delimiter::Comma);
        assert_eq!(rows, vec![vec![r#"say "hi""#, "x"]]);
    }

    #[test]
    fn test_whitespace_splitting() {
        let rows = ingest_with("alpha   beta\tgamma\n one two ", Delimiter::Whitespace);
        assert_eq!(
            rows,
            vec![vec!["alpha", "beta", "gamma"], vec!["one", "two"]]
        );
    }

    #[test]
    fn test_pipe_and_semicolon() {
        assert_eq!(detect_delimiter("a|b|c\nd|e|f"), Delimiter::Pipe);
        assert_eq!(detect_delimiter("a;b;c"), Delimiter::Semicolon);
    }
}
