//! Event locator.
//!
//! Finds the named transitions (`[guard] name { program } -> P()`) of a model
//! and decides which of them write a given state variable. Transition bodies
//! are delimited with the depth-counting scanner, so programs with nested
//! `atomic { if (..) { .. } }` blocks are attributed to the outer event.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scanner::{
    matching_brace, matching_close_bracket, matching_open_bracket, CommentMap,
};

static EVENT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_]\w*(?:\.\w+)*)\s*\{").unwrap());

/// Block keywords of the program language that are followed by `{` but do
/// not name an event.
const BLOCK_KEYWORDS: &[&str] = &[
    "atomic", "if", "else", "while", "for", "ifa", "ifb", "case", "default",
];

/// A repair target: a transition name or the initialization region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventName {
    /// The leading block of `var` declarations.
    Initialization,
    /// A named transition.
    Transition(String),
}

impl EventName {
    /// Token used for the initialization sentinel.
    pub const INITIALIZATION: &'static str = "initialization";

    pub fn transition(name: impl Into<String>) -> Self {
        EventName::Transition(name.into())
    }

    pub fn is_initialization(&self) -> bool {
        matches!(self, EventName::Initialization)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventName::Initialization => Self::INITIALIZATION,
            EventName::Transition(name) => name,
        }
    }
}

impl From<&str> for EventName {
    fn from(value: &str) -> Self {
        match value {
            "init" | Self::INITIALIZATION => EventName::Initialization,
            other => EventName::Transition(other.to_string()),
        }
    }
}

impl From<String> for EventName {
    fn from(value: String) -> Self {
        EventName::from(value.as_str())
    }
}

impl From<EventName> for String {
    fn from(value: EventName) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of one transition in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSite {
    /// Event name as written.
    pub name: String,
    /// Span of the `[ ... ]` guard immediately before the name.
    pub guard: Option<Range<usize>>,
    /// Offset of the first byte of the name.
    pub name_start: usize,
    /// Span from the opening `{` through the matching `}`.
    pub body: Range<usize>,
}

impl TransitionSite {
    /// Start of the region, including the guard when present.
    pub fn start(&self) -> usize {
        self.guard
            .as_ref()
            .map_or(self.name_start, |guard| guard.start)
    }

    pub fn end(&self) -> usize {
        self.body.end
    }
}

/// All transitions of `source` in scan order.
///
/// Transitions nested inside another transition's program are not reported
/// separately; keyword blocks (`atomic`, `if`, ...) are descended into.
pub fn transition_sites(source: &str) -> Vec<TransitionSite> {
    let comments = CommentMap::new(source);
    let mut sites = Vec::new();
    let mut pos = 0;

    while let Some(caps) = EVENT_OPEN_RE.captures_at(source, pos) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let open = whole.end() - 1;

        if comments.contains(name.start()) || BLOCK_KEYWORDS.contains(&name.as_str()) {
            pos = open + 1;
            continue;
        }

        let Some(close) = matching_brace(source, open) else {
            pos = open + 1;
            continue;
        };

        sites.push(TransitionSite {
            name: name.as_str().to_string(),
            guard: guard_before(source, name.start()),
            name_start: name.start(),
            body: open..close + 1,
        });
        pos = close + 1;
    }

    sites
}

/// The `[ ... ]` guard directly before `name_start`, skipping whitespace.
///
/// An empty pair `[]` is the choice operator, not a guard.
fn guard_before(source: &str, name_start: usize) -> Option<Range<usize>> {
    let before = source[..name_start].trim_end();
    if !before.ends_with(']') {
        return None;
    }
    let close = before.len() - 1;
    let open = matching_open_bracket(source, close)?;
    if source[open + 1..close].trim().is_empty() {
        return None;
    }
    Some(open..close + 1)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

fn is_assignment_at(bytes: &[u8], i: usize) -> bool {
    match (bytes.get(i), bytes.get(i + 1)) {
        (Some(b'='), next) => next != Some(&b'='),
        (Some(b'+' | b'-' | b'*' | b'/' | b'%'), Some(b'=')) => true,
        (Some(b'+'), Some(b'+')) | (Some(b'-'), Some(b'-')) => true,
        _ => false,
    }
}

/// Whether `body` assigns to `var`, directly or through index expressions.
///
/// Accepts `v = e`, `v[i] = e`, `v[i][j] = e`, compound assignments and
/// postfix increments. Comparisons (`==`, `<=`, `!=`) are not assignments.
pub fn assigns_to(body: &str, var: &str) -> bool {
    if var.is_empty() {
        return false;
    }
    let comments = CommentMap::new(body);
    let bytes = body.as_bytes();
    let mut from = 0;

    while let Some(rel) = body[from..].find(var) {
        let start = from + rel;
        let end = start + var.len();
        from = end;

        // `n.x` is a member of `n`, not the variable `x`.
        let left_ok = start
            .checked_sub(1)
            .map_or(true, |i| !is_ident_byte(bytes[i]) && bytes[i] != b'.');
        let right_ok = bytes.get(end).map_or(true, |&b| !is_ident_byte(b));
        if !left_ok || !right_ok || comments.contains(start) {
            continue;
        }

        let mut i = skip_spaces(bytes, end);
        while bytes.get(i) == Some(&b'[') {
            match matching_close_bracket(body, i) {
                Some(close) => i = skip_spaces(bytes, close + 1),
                None => break,
            }
        }
        if is_assignment_at(bytes, i) {
            return true;
        }
    }
    false
}

/// Names of the transitions whose program assigns to `var`, in scan order.
pub fn events_assigning(source: &str, var: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for site in transition_sites(source) {
        if assigns_to(&source[site.body.clone()], var) && !names.contains(&site.name) {
            names.push(site.name);
        }
    }
    names
}

/// Repair targets for a set of variables.
///
/// Always starts with [`EventName::Initialization`], followed by every
/// transition that assigns to any of `variables`, deduplicated, in the order
/// the transitions appear in `source`.
pub fn locate_targets(source: &str, variables: &BTreeSet<String>) -> Vec<EventName> {
    let mut targets = vec![EventName::Initialization];
    for site in transition_sites(source) {
        let body = &source[site.body.clone()];
        if variables.iter().any(|var| assigns_to(body, var)) {
            let event = EventName::Transition(site.name);
            if !targets.contains(&event) {
                targets.push(event);
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_event_name_parsing_and_display() {
        assert_eq!(EventName::from("init"), EventName::Initialization);
        assert_eq!(EventName::from("initialization"), EventName::Initialization);
        assert_eq!(EventName::from("promote"), EventName::transition("promote"));
        assert_eq!(EventName::Initialization.to_string(), "initialization");
    }

    #[test]
    fn test_event_name_serde_as_string() {
        let json = serde_json::to_string(&EventName::transition("elect")).unwrap();
        assert_eq!(json, "\"elect\"");
        let back: EventName = serde_json::from_str("\"initialization\"").unwrap();
        assert!(back.is_initialization());
    }

    #[test]
    fn test_sites_skip_keyword_blocks() {
        let src = "P() = e { atomic { x = 1; } } -> P();";
        let sites = transition_sites(src);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "e");
        assert_eq!(&src[sites[0].body.clone()], "{ atomic { x = 1; } }");
    }

    #[test]
    fn test_sites_detect_guard_but_not_choice() {
        let src = "P() = a{} -> P() [] [x > 0 && arr[1] == 2] b{ x = 0; } -> P();";
        let sites = transition_sites(src);
        assert_eq!(sites.len(), 2);
        assert!(sites[0].guard.is_none());
        let guard = sites[1].guard.clone().unwrap();
        assert_eq!(&src[guard], "[x > 0 && arr[1] == 2]");
    }

    #[test]
    fn test_sites_ignore_commented_events() {
        let src = "// old{ x = 1; }\nnew{ x = 2; } -> P()";
        let names: Vec<_> = transition_sites(src).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["new"]);
    }

    #[test]
    fn test_dotted_event_names() {
        let src = "send.1{ turn = 1; } -> P()";
        assert_eq!(transition_sites(src)[0].name, "send.1");
    }

    #[test]
    fn test_assignment_forms() {
        assert!(assigns_to("{ x = 1; }", "x"));
        assert!(assigns_to("{ arr[0] = id; }", "arr"));
        assert!(assigns_to("{ arr [i] [j] = id; }", "arr"));
        assert!(assigns_to("{ arr[idx[0]] = id; }", "arr"));
        assert!(assigns_to("{ count += 1; }", "count"));
        assert!(assigns_to("{ count++; }", "count"));
        assert!(assigns_to("{\n  x\n    = 1;\n}", "x"));
    }

    #[test]
    fn test_non_assignments() {
        assert!(!assigns_to("{ if (x == 1) { y = 2; } }", "x"));
        assert!(!assigns_to("{ y = x; }", "x"));
        assert!(!assigns_to("{ y = (x <= 3); }", "x"));
        assert!(!assigns_to("{ xs = 1; }", "x"));
        assert!(!assigns_to("{ // x = 1;\n }", "x"));
    }

    #[test]
    fn test_locate_targets_indexed_writes() {
        let src = "promote { coordinatorArray[0] = id; coordinatorArray[1] = id; } -> Node1()";
        let targets = locate_targets(src, &vars(&["coordinatorArray"]));
        assert_eq!(
            targets,
            vec![EventName::Initialization, EventName::transition("promote")]
        );
    }

    #[test]
    fn test_member_writes_are_not_variable_writes() {
        assert!(!assigns_to("{ n.x = 1; }", "x"));
        assert!(assigns_to("{ n.x = 1; x = 2; }", "x"));
        let targets = locate_targets("P() = e{ n.x = 1; } -> P();", &vars(&["x"]));
        assert_eq!(targets, vec![EventName::Initialization]);
    }

    #[test]
    fn test_locate_targets_deduplicates_and_keeps_scan_order() {
        let src = "P() = b{ y = 1; } -> Q() [] a{ x = 1; } -> P();\n\
                   Q() = b{ x = 2; } -> P();";
        let targets = locate_targets(src, &vars(&["x", "y"]));
        assert_eq!(
            targets,
            vec![
                EventName::Initialization,
                EventName::transition("b"),
                EventName::transition("a"),
            ]
        );
    }

    #[test]
    fn test_initialization_is_unconditional() {
        let targets = locate_targets("e{ z = 1; } -> P()", &vars(&["unused"]));
        assert_eq!(targets, vec![EventName::Initialization]);
    }

    #[test]
    fn test_events_assigning_single_variable() {
        let src = "a{ x = 1; } -> P() [] b{ y = 1; } -> P() [] c{ x[0] = 2; } -> P()";
        assert_eq!(events_assigning(src, "x"), vec!["a", "c"]);
    }
}
