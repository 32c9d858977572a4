//! Syntax sanitizer for oracle output.
//!
//! Free-form generation tends to produce two defects the CSP# parser
//! rejects: several process calls chained with arrows on one transition,
//! and a `;` after a transition that a choice operator `[]` must follow.
//! [`sanitize`] removes both and runs to a fixed point, so it is idempotent.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A process call such as `Node1()` or `Node((i+1)%N)`. Arguments may nest
/// parentheses up to three levels deep.
pub(crate) const CALL_PATTERN: &str =
    r"[A-Za-z_][\w.]*\s*\((?:[^()]|\((?:[^()]|\([^()]*\))*\))*\)";

/// `-> Call() -> Call() ...`; group 1 is the first call.
pub(crate) static CHAINED_CALLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(->\s*{call})(?:\s*->\s*{call})+",
        call = CALL_PATTERN
    ))
    .unwrap()
});

/// Which transition lines lose their trailing `;`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminatorPolicy {
    /// Every line with an arrow that ends in `);`. Used for region repairs,
    /// where the terminator belongs to the surrounding source.
    #[default]
    EveryTransition,
    /// Only lines whose next non-blank line starts with `[]`. Used for
    /// whole-model repairs, where the last alternative keeps its `;`.
    BeforeChoice,
}

/// Collapse chained process calls, keeping the first target.
pub fn collapse_chained_arrows(text: &str) -> String {
    CHAINED_CALLS_RE.replace_all(text, "$1").into_owned()
}

fn split_newline(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn is_terminated_transition(content: &str) -> bool {
    content.contains("->")
        && content
            .trim_end()
            .strip_suffix(';')
            .is_some_and(|rest| rest.trim_end().ends_with(')'))
}

fn next_line_is_choice(rest: &[&str]) -> bool {
    rest.iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with("[]"))
}

/// Drop the trailing `;` of transition lines selected by `policy`.
pub fn strip_choice_terminators(text: &str, policy: TerminatorPolicy) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len());

    for (idx, line) in lines.iter().enumerate() {
        let (content, newline) = split_newline(line);
        let selected = match policy {
            TerminatorPolicy::EveryTransition => true,
            TerminatorPolicy::BeforeChoice => next_line_is_choice(&lines[idx + 1..]),
        };

        if selected && is_terminated_transition(content) {
            let trimmed = content.trim_end();
            out.push_str(trimmed[..trimmed.len() - 1].trim_end());
            out.push_str(newline);
        } else {
            out.push_str(line);
        }
    }

    out
}

/// Sanitize with an explicit terminator policy.
///
/// Each round only removes text, so the loop ends; the result is a fixed
/// point of both rewrites.
pub fn sanitize_with(text: &str, policy: TerminatorPolicy) -> String {
    let mut current = text.to_string();
    loop {
        let next = collapse_chained_arrows(&strip_choice_terminators(&current, policy));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Sanitize a region replacement.
pub fn sanitize(text: &str) -> String {
    sanitize_with(text, TerminatorPolicy::EveryTransition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_chained_calls() {
        assert_eq!(sanitize("event{} -> A() -> B() -> C()"), "event{} -> A()");
    }

    #[test]
    fn test_collapse_keeps_event_prefix_chains() {
        let text = "a{} -> b{ x = 1; } -> P()";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_collapses_calls_with_nested_arguments() {
        assert_eq!(
            sanitize("e{ x = 1; } -> Node((i+1)%N) -> Node(i)"),
            "e{ x = 1; } -> Node((i+1)%N)"
        );
        assert_eq!(
            sanitize("e{} -> Ring(f((i+1)%N), 0) -> Ring(i, 0);"),
            "e{} -> Ring(f((i+1)%N), 0)"
        );
    }

    #[test]
    fn test_collapse_across_lines() {
        assert_eq!(
            sanitize("e{ x = 1; } -> Node1()\n    -> Node2()"),
            "e{ x = 1; } -> Node1()"
        );
    }

    #[test]
    fn test_strips_terminator_on_transition_lines() {
        let text = "[g] e{ x = 1; } -> Node1();\n[] f{} -> Node1() ;\n";
        assert_eq!(sanitize(text), "[g] e{ x = 1; } -> Node1()\n[] f{} -> Node1()\n");
    }

    #[test]
    fn test_keeps_statement_terminators_inside_programs() {
        let text = "e{\n  x = 1;\n  arr[0] = f(x);\n} -> P()";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_before_choice_policy() {
        let text = "P() = a{} -> P();\n     [] b{} -> P();\nQ() = c{} -> Q();\n";
        let out = sanitize_with(text, TerminatorPolicy::BeforeChoice);
        assert_eq!(
            out,
            "P() = a{} -> P()\n     [] b{} -> P();\nQ() = c{} -> Q();\n"
        );
    }

    #[test]
    fn test_preserves_crlf() {
        assert_eq!(sanitize("e{} -> P();\r\nx"), "e{} -> P()\r\nx");
    }

    #[test]
    fn test_split_arrow_reaches_fixed_point() {
        // Collapsing joins `-> A()` with the `;` of the removed call, which
        // a second round strips.
        let text = "e{} -> A() ->\nB();";
        let once = sanitize(text);
        assert_eq!(once, "e{} -> A()");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_idempotent_on_samples() {
        let samples = [
            "",
            "var x = 0;",
            "event{} -> A() -> B() -> C()",
            "a{} -> P();\n[] b{} -> Q() -> R();\n",
            "[x > 0] e{ atomic { y = 1; } } -> Node1() ;  \n",
            "e{} -> A() ->\nB();\n[] f{} -> C();",
            "P() = a -> b -> Skip;",
            "weird -> -> P();",
            "e{} -> Node((i+1)%N) -> Node(i);\n[] f{} -> Node((i+2)%N);",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", sample);
            let once = sanitize_with(sample, TerminatorPolicy::BeforeChoice);
            assert_eq!(
                sanitize_with(&once, TerminatorPolicy::BeforeChoice),
                once,
                "not idempotent (before-choice) for {:?}",
                sample
            );
        }
    }
}
