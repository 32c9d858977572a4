//! Macro extraction and expansion.
//!
//! CSP# models name boolean expressions with `#define NAME (EXPRESSION);`.
//! Assertions usually mention those names, so dependency analysis has to see
//! the underlying expression. Expansion is a single pass in declaration
//! order: a macro whose body mentions an *earlier* macro is not expanded
//! again. Names are matched as whole identifiers.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SliceError;

static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#?define\s+([A-Za-z_]\w*)\s+(?:as\s+)?\((.*?)\)\s*;").unwrap()
});

static CONSTANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#?define\s+[A-Za-z_]\w*\s+-?[\w.]+\s*;").unwrap()
});

/// A named textual macro taken from the model source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub expansion: String,
}

/// Name→expansion mapping that keeps declaration order.
///
/// Redefining a name replaces the expansion in place: the last definition
/// wins but the name keeps its original position in expansion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    defs: Vec<MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, returning the one it replaced.
    pub fn insert(&mut self, def: MacroDefinition) -> Option<MacroDefinition> {
        match self.defs.iter_mut().find(|d| d.name == def.name) {
            Some(existing) => Some(std::mem::replace(existing, def)),
            None => {
                self.defs.push(def);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.defs
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.expansion.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Replace every whole-identifier occurrence of each macro name.
    pub fn expand(&self, text: &str) -> String {
        let mut out = text.to_string();
        for def in &self.defs {
            let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(&def.name))) else {
                continue;
            };
            out = re.replace_all(&out, NoExpand(&def.expansion)).into_owned();
        }
        out
    }
}

/// Macros found in a model plus the definitions that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct MacroExtraction {
    pub table: MacroTable,
    pub malformed: Vec<SliceError>,
}

/// Collect macro definitions from model source.
///
/// Numeric constants (`#define N 3;`) are not macros and are ignored.
/// Any other `define` line that does not fit the expected shape is reported
/// as [`SliceError::MalformedMacro`] and skipped.
pub fn extract_macros(source: &str) -> MacroExtraction {
    let mut extraction = MacroExtraction::default();

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if !(trimmed.starts_with("#define") || trimmed.starts_with("define ")) {
            continue;
        }

        if let Some(caps) = MACRO_RE.captures(line) {
            let def = MacroDefinition {
                name: caps[1].to_string(),
                expansion: caps[2].trim().to_string(),
            };
            if let Some(previous) = extraction.table.insert(def) {
                debug!(name = %previous.name, "macro redefined; last definition wins");
            }
        } else if CONSTANT_RE.is_match(line) {
            continue;
        } else {
            warn!(line = idx + 1, "skipping malformed macro definition");
            extraction.malformed.push(SliceError::MalformedMacro {
                line: idx + 1,
                text: trimmed.trim_end().to_string(),
            });
        }
    }

    extraction
}

/// Expand `text` with the macros of `table`.
pub fn expand(text: &str, table: &MacroTable) -> String {
    table.expand(text)
}
