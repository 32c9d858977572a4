//! What is sent to an oracle.

use serde::{Deserialize, Serialize};

/// How much of the model the oracle sees and must return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairScope {
    /// One extracted region; the answer replaces only that region.
    #[default]
    Region,
    /// The whole model; the answer replaces the whole file.
    WholeModel,
}

/// One repair attempt for an (assertion, event) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRequest {
    /// Event the region belongs to (`initialization` for the var block).
    pub event: String,
    /// Region text or full model, depending on `scope`.
    pub code: String,
    /// Repair guidance resolved for `event`.
    pub rule: String,
    /// The failed assertion, as reported by the verifier.
    pub assertion: String,
    pub scope: RepairScope,
}

impl RepairRequest {
    pub fn region(
        event: impl Into<String>,
        code: impl Into<String>,
        rule: impl Into<String>,
        assertion: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            code: code.into(),
            rule: rule.into(),
            assertion: assertion.into(),
            scope: RepairScope::Region,
        }
    }

    pub fn whole_model(
        event: impl Into<String>,
        code: impl Into<String>,
        rule: impl Into<String>,
        assertion: impl Into<String>,
    ) -> Self {
        Self {
            scope: RepairScope::WholeModel,
            ..Self::region(event, code, rule, assertion)
        }
    }
}
