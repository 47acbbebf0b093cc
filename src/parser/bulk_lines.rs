use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// One accepted `<duration> <value>` import line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub duration: String,
    pub key_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingValue,
    BadDuration,
    DuplicateInBatch,
    AlreadyExists,
}

/// A rejected line, carried back verbatim so the operator can fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLine {
    pub line: String,
    pub reason: RejectReason,
}

#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub accepted: Vec<ParsedLine>,
    pub rejected: Vec<RejectedLine>,
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+[dm]|lifetime)$").expect("Invalid regex"))
}

/// Whether a token is a recognized duration label ("1d", "7d", "1m",
/// "lifetime", case-insensitive). The label stays opaque after this check;
/// nothing in this crate interprets it as an expiry window.
#[must_use]
pub fn is_duration_token(token: &str) -> bool {
    duration_re().is_match(token)
}

/// Parse a multi-line key import. Each non-blank line must be
/// `<duration-token> <key-value>`; a line that fails the pattern, repeats a
/// value within the batch, or collides with `existing` is rejected
/// individually. A bad line never aborts the batch.
#[must_use]
pub fn parse_bulk_lines(raw: &str, existing: &HashSet<String>) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    let mut seen: HashSet<String> = HashSet::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reject = |reason| RejectedLine {
            line: line.to_string(),
            reason,
        };

        let Some((first, rest)) = split_first_token(trimmed) else {
            batch.rejected.push(reject(RejectReason::MissingValue));
            continue;
        };

        if !is_duration_token(first) {
            batch.rejected.push(reject(RejectReason::BadDuration));
            continue;
        }

        let value = rest.trim();
        if value.is_empty() {
            batch.rejected.push(reject(RejectReason::MissingValue));
            continue;
        }

        if seen.contains(value) {
            batch.rejected.push(reject(RejectReason::DuplicateInBatch));
            continue;
        }

        if existing.contains(value) {
            batch.rejected.push(reject(RejectReason::AlreadyExists));
            continue;
        }

        seen.insert(value.to_string());
        batch.accepted.push(ParsedLine {
            duration: first.to_lowercase(),
            key_value: value.to_string(),
        });
    }

    batch
}

/// Split off the first whitespace-delimited token; the remainder (which may
/// itself contain spaces) is the key value.
fn split_first_token(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let first = parts.next()?;
    let rest = parts.next().unwrap_or("");
    Some((first, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_existing() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_accepts_basic_lines() {
        let batch = parse_bulk_lines("1d ABC-123\n7d XYZ-999\nlifetime KEY-1", &no_existing());
        assert_eq!(batch.rejected.len(), 0);
        assert_eq!(
            batch.accepted,
            vec![
                ParsedLine {
                    duration: "1d".to_string(),
                    key_value: "ABC-123".to_string()
                },
                ParsedLine {
                    duration: "7d".to_string(),
                    key_value: "XYZ-999".to_string()
                },
                ParsedLine {
                    duration: "lifetime".to_string(),
                    key_value: "KEY-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_within_batch() {
        let batch = parse_bulk_lines("1d ABC\n1d ABC\n7d XYZ", &no_existing());
        assert_eq!(batch.accepted.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].line, "1d ABC");
        assert_eq!(batch.rejected[0].reason, RejectReason::DuplicateInBatch);
    }

    #[test]
    fn test_duplicate_against_existing() {
        let existing: HashSet<String> = ["OLD-KEY".to_string()].into_iter().collect();
        let batch = parse_bulk_lines("1m OLD-KEY\n1m NEW-KEY", &existing);
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.accepted[0].key_value, "NEW-KEY");
        assert_eq!(batch.rejected[0].reason, RejectReason::AlreadyExists);
    }

    #[test]
    fn test_bad_duration_token() {
        let batch = parse_bulk_lines("forever ABC\n1x ABC\nd1 ABC", &no_existing());
        assert!(batch.accepted.is_empty());
        assert_eq!(batch.rejected.len(), 3);
        assert!(
            batch
                .rejected
                .iter()
                .all(|r| r.reason == RejectReason::BadDuration)
        );
    }

    #[test]
    fn test_missing_value() {
        let batch = parse_bulk_lines("1d\n7d   ", &no_existing());
        assert!(batch.accepted.is_empty());
        assert_eq!(batch.rejected.len(), 2);
        assert!(
            batch
                .rejected
                .iter()
                .all(|r| r.reason == RejectReason::MissingValue)
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let batch = parse_bulk_lines("\n\n1d ABC\n\n", &no_existing());
        assert_eq!(batch.accepted.len(), 1);
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn test_duration_case_normalized() {
        let batch = parse_bulk_lines("1D ABC\nLIFETIME DEF", &no_existing());
        assert_eq!(batch.accepted[0].duration, "1d");
        assert_eq!(batch.accepted[1].duration, "lifetime");
    }

    #[test]
    fn test_value_may_contain_spaces() {
        let batch = parse_bulk_lines("1d AAAA BBBB CCCC", &no_existing());
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.accepted[0].key_value, "AAAA BBBB CCCC");
    }

    #[test]
    fn test_is_duration_token() {
        assert!(is_duration_token("1d"));
        assert!(is_duration_token("30D"));
        assert!(is_duration_token("12m"));
        assert!(is_duration_token("lifetime"));
        assert!(!is_duration_token("1w"));
        assert!(!is_duration_token("d"));
        assert!(!is_duration_token(""));
    }
}
