//! Syntax-safe splicing of replacements into the working model.
//!
//! A splice is accepted only when the region still matches the working text
//! at its recorded offsets and the result keeps the model's structural
//! invariants: balanced braces and no arrow without a process call between
//! it and the next arrow. Replacement happens by offsets, never by first
//! textual occurrence.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SliceError};
use crate::region::Region;
use crate::sanitizer::{CALL_PATTERN, CHAINED_CALLS_RE};
use crate::scanner::{brace_balance, BraceBalance};

static DOUBLE_ARROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"->\s*->").unwrap());

static TRAILING_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"->\s*{}\s*$", CALL_PATTERN)).unwrap());

static LEADING_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*->\s*{}", CALL_PATTERN)).unwrap());

/// `-> Call() ->`: a process call used as an event prefix.
static CALL_THEN_ARROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"->\s*{}\s*->", CALL_PATTERN)).unwrap());

/// Structural facts about a text that a splice must not make worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxAudit {
    pub braces: BraceBalance,
    /// `-> ->` with nothing but whitespace between.
    pub double_arrows: usize,
    /// Runs of `-> Call() -> Call()`.
    pub chained_calls: usize,
    /// `-> Call() ->`, whatever follows the second arrow.
    pub call_then_arrow: usize,
}

impl SyntaxAudit {
    pub fn of(text: &str) -> Self {
        Self {
            braces: brace_balance(text),
            double_arrows: DOUBLE_ARROW_RE.find_iter(text).count(),
            chained_calls: CHAINED_CALLS_RE.find_iter(text).count(),
            call_then_arrow: CALL_THEN_ARROW_RE.find_iter(text).count(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.braces.is_balanced()
            && self.double_arrows == 0
            && self.chained_calls == 0
            && self.call_then_arrow == 0
    }

    /// Why `self` is worse than `before`, if it is.
    pub fn regression_from(&self, before: &SyntaxAudit) -> Option<String> {
        if before.braces.is_balanced() && !self.braces.is_balanced() {
            return Some(format!("model braces become {}", self.braces));
        }
        if self.double_arrows > before.double_arrows {
            return Some(format!(
                "double arrows increase from {} to {}",
                before.double_arrows, self.double_arrows
            ));
        }
        if self.chained_calls > before.chained_calls {
            return Some(format!(
                "chained process calls increase from {} to {}",
                before.chained_calls, self.chained_calls
            ));
        }
        if self.call_then_arrow > before.call_then_arrow {
            return Some(format!(
                "process calls followed by an arrow increase from {} to {}",
                before.call_then_arrow, self.call_then_arrow
            ));
        }
        None
    }
}

/// Result of an accepted splice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpliceOutcome {
    /// The new working text.
    pub text: String,
    /// Whether the region text occurred exactly once in the working text.
    pub unique: bool,
    /// Whether the replacement's own `-> Call()` superseded the one that
    /// followed the region in the source.
    pub continuation_replaced: bool,
}

fn rejected(region: &Region, reason: impl Into<String>) -> SliceError {
    SliceError::SanitizationRejected {
        event: region.event().to_string(),
        reason: reason.into(),
    }
}

/// Validate `replacement` against the invariants of the text it enters.
pub fn validate_replacement(region: &Region, replacement: &str) -> Result<()> {
    if replacement.trim().is_empty() {
        return Err(rejected(region, "replacement is empty"));
    }
    let audit = SyntaxAudit::of(replacement);
    if !audit.braces.is_balanced() {
        return Err(rejected(region, format!("replacement braces are {}", audit.braces)));
    }
    if audit.double_arrows > 0 {
        return Err(rejected(region, "replacement contains adjacent arrows"));
    }
    if audit.chained_calls > 0 {
        return Err(rejected(region, "replacement chains process calls"));
    }
    if audit.call_then_arrow > 0 {
        return Err(rejected(region, "replacement continues after a process call"));
    }
    Ok(())
}

/// Substitute `region` in `working` with an already sanitized `replacement`.
///
/// On error the caller keeps `working` unchanged.
pub fn splice(working: &str, region: &Region, replacement: &str) -> Result<SpliceOutcome> {
    if !region.is_current(working) {
        return Err(SliceError::StaleRegion {
            event: region.event().to_string(),
        });
    }
    validate_replacement(region, replacement)?;

    let occurrences = working.matches(region.full_text.as_str()).count();
    let unique = occurrences == 1;
    if !unique {
        warn!(
            event = %region.event(),
            occurrences,
            "region text is not unique; replacing at extraction offsets"
        );
    }

    let head = &working[..region.span.start];
    let mut tail = &working[region.span.end..];
    let mut continuation_replaced = false;
    if TRAILING_CALL_RE.is_match(replacement) {
        if let Some(m) = LEADING_CALL_RE.find(tail) {
            tail = &tail[m.end()..];
            continuation_replaced = true;
        } else if tail.trim_start().starts_with("->") {
            return Err(rejected(
                region,
                "replacement ends in a process call but the region is followed by another event",
            ));
        }
    }

    let mut text = String::with_capacity(head.len() + replacement.len() + tail.len());
    text.push_str(head);
    text.push_str(replacement);
    text.push_str(tail);

    let before = SyntaxAudit::of(working);
    let after = SyntaxAudit::of(&text);
    if let Some(reason) = after.regression_from(&before) {
        return Err(rejected(region, reason));
    }

    debug!(
        event = %region.event(),
        unique,
        continuation_replaced,
        delta = text.len() as i64 - working.len() as i64,
        "region spliced"
    );
    Ok(SpliceOutcome {
        text,
        unique,
        continuation_replaced,
    })
}
