//! CSP-Slicer: structural slicing and splicing for CSP# process models
//!
//! This crate decides which parts of a model a failed assertion depends on
//! and gives back exact, self-contained slices of the model text that can be
//! rewritten in isolation and spliced back without breaking the syntax.
//!
//! ## Layer 0 - Text structure
//!
//! Focus: deterministic, offset-exact text analysis. No I/O, no async.
//!
//! ## Key Components
//!
//! - `scanner`: depth-counting brace/bracket matching that skips comments
//! - `MacroTable`: `#define NAME (EXPR);` extraction and single-pass expansion
//! - `extract_variables`: state variables of an expanded assertion
//! - `locate_targets`: initialization sentinel plus every transition that
//!   assigns a variable
//! - `Region`: the init block or one `[guard] name { ... }` transition
//! - `sanitize`: fixed-point cleanup of chained arrows and stray `;`
//! - `splice`: offset-based substitution guarded by a `SyntaxAudit`

pub mod analysis;
mod error;
pub mod locator;
pub mod macros;
pub mod region;
pub mod sanitizer;
pub mod scanner;
pub mod splice;
pub mod variables;

pub use analysis::{analyze_assertion, TargetAnalysis};
pub use error::{Result, SliceError};
pub use locator::{assigns_to, events_assigning, locate_targets, transition_sites, EventName};
pub use macros::{expand, extract_macros, MacroDefinition, MacroExtraction, MacroTable};
pub use region::{extract_init, extract_region, extract_transition, Region, RegionKind};
pub use sanitizer::{sanitize, sanitize_with, TerminatorPolicy};
pub use scanner::{brace_balance, BraceBalance};
pub use splice::{splice, validate_replacement, SpliceOutcome, SyntaxAudit};
pub use variables::{extract_variables, KeywordSet, DEFAULT_KEYWORDS};
