//! TAP rendering and result aggregation.

use std::collections::HashMap;

use clap::ValueEnum;

use crate::models::TestResult;

/// Largest start number accepted; floats lose integer precision beyond it.
const MAX_OFFSET: f64 = 9_007_199_254_740_991.0;

/// Parse a user-supplied start number. Anything that is not a non-zero
/// number within `±MAX_OFFSET` yields `None`, which renders from 1.
pub fn parse_offset(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && n.abs() <= MAX_OFFSET)
        .map(|n| n.trunc() as i64)
        .filter(|&n| n != 0)
}

/// Render `results` as TAP lines, numbered from `offset` (1 when unset or
/// zero). No plan line is written.
pub fn to_tap(
    results: &[TestResult],
    mappings: &HashMap<String, String>,
    offset: Option<i64>,
) -> String {
    let mut number = offset.filter(|&n| n != 0).unwrap_or(1);
    let mut out = String::new();
    for result in results {
        let name = mappings
            .get(&result.name)
            .filter(|mapped| !mapped.is_empty())
            .unwrap_or(&result.name);
        let status = if result.ok { "ok" } else { "not ok" };
        out.push_str(&format!("{} {} {}\n", status, number, name));
        number = number.saturating_add(1);

        if let Some(message) = result.message.as_deref().filter(|m| !m.is_empty()) {
            for line in message.split('\n') {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }
    out
}

/// True when every result passed (vacuously true for no results).
pub fn all_green(results: &[TestResult]) -> bool {
    results.iter().all(|r| r.ok)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Expectation {
    Pass,
    Fail,
}

/// Collapse a whole report into one result named `name`.
///
/// With [`Expectation::Pass`] the result lists the failed cases in its
/// message; with [`Expectation::Fail`] it passes only if something failed.
pub fn squash(name: &str, results: &[TestResult], expectation: Expectation) -> TestResult {
    let failed: Vec<&TestResult> = results.iter().filter(|r| !r.ok).collect();
    match expectation {
        Expectation::Pass => TestResult::new(name, failed.is_empty()).with_message(
            failed
                .iter()
                .map(|r| format!("* {}", r.name))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Expectation::Fail => TestResult::new(name, !failed.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn results() -> Vec<TestResult> {
        vec![
            TestResult::new("C adds", true),
            TestResult::new("C divides", false).with_message("boom\n  at C.divide"),
            TestResult::new("C subtracts", true),
        ]
    }

    #[test]
    fn renders_one_line_per_result_with_indented_messages() {
        let tap = to_tap(&results(), &HashMap::new(), None);
        assert_eq!(
            tap,
            "ok 1 C adds\n\
             not ok 2 C divides\n    boom\n      at C.divide\n\
             ok 3 C subtracts\n"
        );
        let result_lines = tap.lines().filter(|l| !l.starts_with("    ")).count();
        assert_eq!(result_lines, results().len());
    }

    #[test]
    fn numbers_from_offset() {
        let tap = to_tap(&results(), &HashMap::new(), Some(5));
        let numbers: Vec<_> = tap
            .lines()
            .filter(|l| !l.starts_with("    "))
            .map(|l| l.split(' ').rev().nth(2).unwrap_or_default().to_string())
            .collect();
        assert_eq!(numbers, vec!["5", "6", "7"]);
    }

    #[test]
    fn invalid_offsets_start_at_one() {
        for raw in ["0", "NaN", "", "abc", "inf"] {
            assert_eq!(parse_offset(raw), None, "{raw:?}");
        }
        assert_eq!(parse_offset(" 12 "), Some(12));
        let tap = to_tap(&results()[..1], &HashMap::new(), Some(0));
        assert_eq!(tap, "ok 1 C adds\n");
    }

    #[test]
    fn out_of_range_offsets_start_at_one() {
        assert_eq!(parse_offset("1e300"), None);
        assert_eq!(parse_offset("9223372036854775807"), None);
        assert_eq!(parse_offset("-1e300"), None);
        assert_eq!(parse_offset("9007199254740991"), Some(9_007_199_254_740_991));

        let tap = to_tap(&results()[..2], &HashMap::new(), parse_offset("1e300"));
        assert!(tap.starts_with("ok 1 C adds\nnot ok 2 C divides\n"));
    }

    #[test]
    fn numbering_stops_at_the_largest_offset() {
        let tap = to_tap(&results()[..2], &HashMap::new(), Some(i64::MAX));
        let lines: Vec<_> = tap.lines().collect();
        assert_eq!(lines[0], format!("ok {} C adds", i64::MAX));
        assert_eq!(lines[1], format!("not ok {} C divides", i64::MAX));
    }

    #[test]
    fn applies_name_mappings() {
        let mappings = HashMap::from([
            ("C adds".to_string(), "Addition works".to_string()),
            ("C subtracts".to_string(), String::new()),
        ]);
        let tap = to_tap(&results(), &mappings, None);
        let lines: Vec<_> = tap.lines().collect();
        assert_eq!(lines[0], "ok 1 Addition works");
        assert_eq!(lines[1], "not ok 2 C divides");
        assert_eq!(lines[4], "ok 3 C subtracts");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(to_tap(&[], &HashMap::new(), Some(3)), "");
        assert!(all_green(&[]));
    }

    #[test]
    fn squash_expecting_pass_lists_failures() {
        let squashed = squash("suite", &results(), Expectation::Pass);
        assert_eq!(
            squashed,
            TestResult::new("suite", false).with_message("* C divides")
        );

        let green = squash("suite", &results()[..1], Expectation::Pass);
        assert_eq!(green, TestResult::new("suite", true));
    }

    #[test]
    fn squash_expecting_fail_passes_on_any_failure() {
        assert!(squash("broken", &results(), Expectation::Fail).ok);
        assert!(!squash("broken", &results()[..1], Expectation::Fail).ok);
        assert!(!all_green(&results()));
    }
}
