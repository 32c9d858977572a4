//! Assertion-to-target analysis: the read-only half of a repair pass.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::SliceError;
use crate::locator::{locate_targets, EventName};
use crate::macros::{expand, extract_macros};
use crate::variables::{extract_variables, KeywordSet};

/// Everything derived from one assertion against one model text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetAnalysis {
    pub assertion: String,
    /// The assertion after macro expansion.
    pub expanded: String,
    pub variables: BTreeSet<String>,
    /// Repair targets; the initialization sentinel comes first.
    pub events: Vec<EventName>,
    /// Definitions that looked like macros but could not be read.
    #[serde(skip)]
    pub malformed_macros: Vec<SliceError>,
}

/// Expand `assertion` with the macros of `source`, extract its variables and
/// locate the transitions that write them.
pub fn analyze_assertion(assertion: &str, source: &str, keywords: &KeywordSet) -> TargetAnalysis {
    let extraction = extract_macros(source);
    let expanded = expand(assertion, &extraction.table);

    // Macro names used as propositions are not state.
    let mut keywords = keywords.clone();
    keywords.extend(extraction.table.iter().map(|def| def.name.clone()));

    let variables = extract_variables(&expanded, &keywords);
    let events = locate_targets(source, &variables);

    TargetAnalysis {
        assertion: assertion.to_string(),
        expanded,
        variables,
        events,
        malformed_macros: extraction.malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_assertion_targets() {
        let source = "\
#define COORDINATOR_ROLE 1;
define Ready as (role == COORDINATOR_ROLE);
var role = 0;
P() = elect{ role = COORDINATOR_ROLE; } -> P() [] idle{ skip = 1; } -> P();
";
        let analysis = analyze_assertion("Ready", source, &KeywordSet::default());
        assert_eq!(analysis.expanded, "role == COORDINATOR_ROLE");
        assert_eq!(
            analysis.variables.iter().cloned().collect::<Vec<_>>(),
            vec!["role"]
        );
        assert_eq!(
            analysis.events,
            vec![EventName::Initialization, EventName::transition("elect")]
        );
        assert!(analysis.malformed_macros.is_empty());
    }

    #[test]
    fn test_lowercase_macro_names_are_not_variables() {
        let source = "#define ready (x == 1);\nvar x = 0;\nP() = go{ x = 1; } -> P();";
        let analysis = analyze_assertion("ready && y", source, &KeywordSet::default());
        assert_eq!(
            analysis.variables.iter().cloned().collect::<Vec<_>>(),
            vec!["x", "y"]
        );
    }
}
