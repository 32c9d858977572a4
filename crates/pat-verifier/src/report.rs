//! PAT report parsing.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::record::FailureRecord;

static FAILED_ASSERTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Assertion\s+(.*?)\s+is\s+(?:NOT valid|Invalid)").unwrap()
});

/// Failed assertions in a checker report, in report order.
pub fn parse_report(content: &str, model: &Path) -> Vec<FailureRecord> {
    FAILED_ASSERTION_RE
        .captures_iter(content)
        .map(|caps| FailureRecord::failed(caps[1].trim(), model))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
=======================================================
Assertion: System() |= [] one_coordinator
********Verification Result********
The Assertion System() |= [] one_coordinator is NOT valid.
A counterexample is presented as follows.
<init -> promote_to_coordinator -> ...>
The Assertion System() deadlockfree is VALID.
The assertion System() reaches Ready is invalid.
";

    #[test]
    fn test_parses_failed_assertions_in_order() {
        let records = parse_report(REPORT, Path::new("leader.csp"));
        let assertions: Vec<_> = records.iter().map(|r| r.assertion.as_str()).collect();
        assert_eq!(
            assertions,
            vec!["System() |= [] one_coordinator", "System() reaches Ready"]
        );
        assert!(records
            .iter()
            .all(|r| r.source_model == Path::new("leader.csp")));
    }

    #[test]
    fn test_valid_only_report_has_no_failures() {
        let report = "The Assertion System() deadlockfree is VALID.\n";
        assert!(parse_report(report, Path::new("m.csp")).is_empty());
    }
}
