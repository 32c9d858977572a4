//! Region extraction.
//!
//! A region is the exact slice of the working text handed to the oracle:
//! either the leading run of `var` declarations or one transition with its
//! optional guard. Offsets are only valid for the text they were taken from;
//! callers re-extract after every mutation.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};
use crate::locator::{transition_sites, EventName};
use crate::scanner::{brace_balance, skip_trivia, statement_end, BraceBalance, CommentMap};

static DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:hvar|var)(?:\s|<)").unwrap());

/// What a region covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Contiguous `var` declarations.
    Init,
    /// `[guard] name { program }`.
    Transition,
    /// The entire model, used by whole-file repair.
    Model,
}

/// A structurally bounded span of model text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub kind: RegionKind,
    /// Transition name; `None` for init and whole-model regions.
    pub name: Option<String>,
    /// Guard text including the brackets.
    pub guard: Option<String>,
    /// Offsets of `full_text` in the text it was extracted from.
    pub span: Range<usize>,
    /// Offsets of the `{ ... }` program for transitions; equal to `span`
    /// otherwise.
    pub body_span: Range<usize>,
    pub full_text: String,
}

impl Region {
    /// A region spanning all of `source`.
    pub fn whole_model(source: &str) -> Self {
        Self {
            kind: RegionKind::Model,
            name: None,
            guard: None,
            span: 0..source.len(),
            body_span: 0..source.len(),
            full_text: source.to_string(),
        }
    }

    /// The event this region was extracted for.
    pub fn event(&self) -> EventName {
        match (&self.kind, &self.name) {
            (RegionKind::Transition, Some(name)) => EventName::Transition(name.clone()),
            _ => EventName::Initialization,
        }
    }

    /// Whether `text` still holds `full_text` at `span`.
    pub fn is_current(&self, text: &str) -> bool {
        text.get(self.span.clone()) == Some(self.full_text.as_str())
    }

    pub fn body(&self) -> &str {
        let start = self.body_span.start - self.span.start;
        let end = self.body_span.end - self.span.start;
        &self.full_text[start..end]
    }
}

/// Extract the region for `event` from the current text.
pub fn extract_region(source: &str, event: &EventName) -> Result<Region> {
    match event {
        EventName::Initialization => extract_init(source),
        EventName::Transition(name) => extract_transition(source, name),
    }
}

fn at_statement_start(source: &str, pos: usize, comments: &CommentMap) -> bool {
    let bytes = source.as_bytes();
    let mut i = pos;
    while i > 0 {
        let prev = i - 1;
        if let Some(span) = comments.span_containing(prev) {
            i = span.start;
        } else if bytes[prev].is_ascii_whitespace() {
            i = prev;
        } else {
            return matches!(bytes[prev], b';' | b'}' | b'{');
        }
    }
    true
}

fn is_top_level(source: &str, pos: usize) -> bool {
    !matches!(brace_balance(&source[..pos]), BraceBalance::Unclosed { .. })
}

fn starts_declaration(source: &str, at: usize) -> bool {
    DECL_RE
        .find_at(source, at)
        .is_some_and(|m| m.start() == at)
}

/// The maximal run of top-level variable declarations, starting at the
/// first one. Whitespace and comments between declarations stay inside the
/// run.
pub fn extract_init(source: &str) -> Result<Region> {
    let not_found = || SliceError::RegionNotFound {
        event: EventName::INITIALIZATION.to_string(),
    };
    let comments = CommentMap::new(source);

    let start = DECL_RE
        .find_iter(source)
        .map(|m| m.start())
        .find(|&pos| {
            !comments.contains(pos)
                && at_statement_start(source, pos, &comments)
                && is_top_level(source, pos)
        })
        .ok_or_else(not_found)?;

    let mut end = statement_end(source, start).ok_or_else(not_found)? + 1;
    loop {
        let next = skip_trivia(source, end);
        if !starts_declaration(source, next) {
            break;
        }
        match statement_end(source, next) {
            Some(semi) => end = semi + 1,
            None => break,
        }
    }

    Ok(Region {
        kind: RegionKind::Init,
        name: None,
        guard: None,
        span: start..end,
        body_span: start..end,
        full_text: source[start..end].to_string(),
    })
}

/// The first transition named `name`, with its guard when one precedes it.
pub fn extract_transition(source: &str, name: &str) -> Result<Region> {
    let site = transition_sites(source)
        .into_iter()
        .find(|site| site.name == name)
        .ok_or_else(|| SliceError::RegionNotFound {
            event: name.to_string(),
        })?;

    let span = site.start()..site.end();
    Ok(Region {
        kind: RegionKind::Transition,
        name: Some(site.name),
        guard: site.guard.map(|guard| source[guard].to_string()),
        full_text: source[span.clone()].to_string(),
        span,
        body_span: site.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "\
#define N 3;
var role = 0;
var coordinatorArray[N] = [0, 0, 0]; // who leads
var id = 1;

Node1() = [role == 0 &&
           id > 0] promote { atomic { coordinatorArray[0] = id; } } -> Node1()
        [] receive { role = 1; } -> Node1();
";

    #[test]
    fn test_init_region_is_contiguous_run() {
        let region = extract_init(MODEL).unwrap();
        assert_eq!(region.kind, RegionKind::Init);
        assert_eq!(
            region.full_text,
            "var role = 0;\nvar coordinatorArray[N] = [0, 0, 0]; // who leads\nvar id = 1;"
        );
        assert!(region.is_current(MODEL));
    }

    #[test]
    fn test_init_stops_at_first_gap() {
        let src = "var a = 0;\nchannel c 0;\nvar b = 1;";
        let region = extract_init(src).unwrap();
        assert_eq!(region.full_text, "var a = 0;");
    }

    #[test]
    fn test_init_ignores_commented_and_local_declarations() {
        let src = "// var ghost = 0;\nP() = e{ var t = 1; } -> P();\nvar real = 2;";
        let region = extract_init(src).unwrap();
        assert_eq!(region.full_text, "var real = 2;");
    }

    #[test]
    fn test_init_not_found() {
        let err = extract_init("P() = e{} -> P();").unwrap_err();
        assert_eq!(
            err,
            SliceError::RegionNotFound {
                event: "initialization".to_string()
            }
        );
    }

    #[test]
    fn test_transition_with_multiline_guard() {
        let region = extract_transition(MODEL, "promote").unwrap();
        assert_eq!(
            region.full_text,
            "[role == 0 &&\n           id > 0] promote { atomic { coordinatorArray[0] = id; } }"
        );
        assert_eq!(
            region.guard.as_deref(),
            Some("[role == 0 &&\n           id > 0]")
        );
        assert_eq!(region.body(), "{ atomic { coordinatorArray[0] = id; } }");
        assert_eq!(region.event(), EventName::transition("promote"));
    }

    #[test]
    fn test_transition_without_guard() {
        let region = extract_transition(MODEL, "receive").unwrap();
        assert_eq!(region.full_text, "receive { role = 1; }");
        assert!(region.guard.is_none());
    }

    #[test]
    fn test_transition_not_found() {
        assert!(matches!(
            extract_transition(MODEL, "missing"),
            Err(SliceError::RegionNotFound { .. })
        ));
    }

    #[test]
    fn test_keyword_blocks_are_not_regions() {
        assert!(extract_transition(MODEL, "atomic").is_err());
    }

    #[test]
    fn test_round_trip_identity() {
        for event in [
            EventName::Initialization,
            EventName::transition("promote"),
            EventName::transition("receive"),
        ] {
            let region = extract_region(MODEL, &event).unwrap();
            let rebuilt = format!(
                "{}{}{}",
                &MODEL[..region.span.start],
                region.full_text,
                &MODEL[region.span.end..]
            );
            assert_eq!(rebuilt, MODEL);
        }
    }

    #[test]
    fn test_whole_model_region() {
        let region = Region::whole_model(MODEL);
        assert_eq!(region.kind, RegionKind::Model);
        assert!(region.is_current(MODEL));
        assert!(region.event().is_initialization());
    }
}
