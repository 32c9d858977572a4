//! State-variable extraction from expanded assertions.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-z][a-zA-Z0-9_]*)\b").unwrap());

/// Identifiers that look like variables but never are.
pub const DEFAULT_KEYWORDS: &[&str] = &["assert", "if", "else", "true", "false", "var"];

/// Configurable exclusion set applied after identifier extraction.
///
/// Models introduce their own reserved names (process constants, macro
/// names used as propositions), so callers extend the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    words: BTreeSet<String>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            words: DEFAULT_KEYWORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl KeywordSet {
    /// Defaults plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.extend(extra);
        set
    }

    pub fn extend<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(extra.into_iter().map(Into::into));
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

/// Candidate state variables of an expanded assertion.
///
/// Array accesses contribute their base name: `coordinatorArray[0]` yields
/// `coordinatorArray`. The result is ordered so that downstream scans are
/// deterministic.
pub fn extract_variables(expanded: &str, keywords: &KeywordSet) -> BTreeSet<String> {
    IDENT_RE
        .captures_iter(expanded)
        .map(|caps| caps[1].to_string())
        .filter(|ident| !keywords.contains(ident))
        .collect()
}
