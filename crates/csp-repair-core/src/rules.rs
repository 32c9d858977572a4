//! Event → repair rule dispatch.
//!
//! Rules are structured descriptors looked up by event name: exact match,
//! then alias, then the default rule. The initialization region uses the
//! `init` key.

use std::collections::BTreeMap;

use csp_slicer::EventName;
use serde::{Deserialize, Serialize};

/// Key of the fallback rule.
pub const DEFAULT_RULE: &str = "default";

/// Key of the initialization rule.
pub const INIT_RULE: &str = "init";

/// Guidance handed to the oracle for one kind of event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    /// Filled from the rule book key when loaded from configuration.
    #[serde(default)]
    pub name: String,
    /// One numbered instruction per entry.
    pub guidance: Vec<String>,
}

impl RuleDescriptor {
    pub fn new(name: &str, guidance: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            guidance: guidance.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// Numbered guidance text as it appears in prompts.
    pub fn text(&self) -> String {
        self.guidance
            .iter()
            .enumerate()
            .map(|(idx, line)| format!("{}. {}", idx + 1, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Mapping from event names to rules, with aliases and a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBook {
    rules: BTreeMap<String, RuleDescriptor>,
    aliases: BTreeMap<String, String>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleBook {
    /// A book holding only `default`.
    pub fn with_default(default: RuleDescriptor) -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(
            DEFAULT_RULE.to_string(),
            RuleDescriptor {
                name: DEFAULT_RULE.to_string(),
                ..default
            },
        );
        Self {
            rules,
            aliases: BTreeMap::new(),
        }
    }

    /// Rules for leader-election style models.
    pub fn builtin() -> Self {
        Self::with_default(RuleDescriptor::new(
            DEFAULT_RULE,
            &[
                "ATOMIC SYNCHRONIZATION: All state updates (variables and arrays) MUST be wrapped \
                 in a single 'atomic{}' block to ensure property consistency.",
                "SCOPE INTEGRITY: Only use variables and constants defined in the model. Do not \
                 invent new state variables like 'node_state' or 'status'.",
                "SYNTAX: Ensure the transition follows the format: event{atomic{...}} -> ProcessName().",
                "CHOICE CHAIN: Do not include a trailing semicolon (;) at the end of the line. \
                 The Choice Operator '[]' must be able to follow this line immediately.",
            ],
        ))
        .with_rule(RuleDescriptor::new(
            INIT_RULE,
            &[
                "GLOBAL STATE: Ensure all variables in the 'var' section are initialized to a \
                 neutral state (e.g., 0 or PROCESSOR_ROLE).",
                "ARRAY CONSISTENCY: Ensure arrays like 'coordinatorArray' are fully initialized \
                 to match the required system size.",
            ],
        ))
        .with_rule(RuleDescriptor::new(
            "promote_to_coordinator",
            &[
                "SELF-ELECTION: When a node promotes itself, it must update its 'role' to \
                 COORDINATOR_ROLE and set ALL indices of 'coordinatorArray' to its own ID.",
                "ATOMICITY: These updates must happen in one atomic step to satisfy safety \
                 assertions.",
            ],
        ))
        .with_rule(RuleDescriptor::new(
            "receive_coordinator_message",
            &[
                "FOLLOWER SYNC: When receiving a message, update 'role' to PROCESSOR_ROLE and \
                 synchronize ALL indices of 'coordinatorArray' to the sender's ID.",
                "GLOBAL VIEW: The property depends on Node1 knowing who leads Node2 and Node3; \
                 therefore, update indices [0], [1], and [2] simultaneously.",
            ],
        ))
        .with_alias(
            "receive_coordinator_message_from_NODE2",
            "receive_coordinator_message",
        )
        .with_alias(
            "receive_coordinator_message_from_NODE3",
            "receive_coordinator_message",
        )
    }

    /// Add or replace a rule under its own name.
    pub fn with_rule(mut self, rule: RuleDescriptor) -> Self {
        self.insert(rule);
        self
    }

    pub fn with_alias(mut self, event: &str, rule: &str) -> Self {
        self.aliases.insert(event.to_string(), rule.to_string());
        self
    }

    pub fn insert(&mut self, rule: RuleDescriptor) -> Option<RuleDescriptor> {
        self.rules.insert(rule.name.clone(), rule)
    }

    pub fn alias(&mut self, event: &str, rule: &str) {
        self.aliases.insert(event.to_string(), rule.to_string());
    }

    /// Aliases whose target rule does not exist.
    pub fn dangling_aliases(&self) -> Vec<(&str, &str)> {
        self.aliases
            .iter()
            .filter(|(_, target)| !self.rules.contains_key(*target))
            .map(|(alias, target)| (alias.as_str(), target.as_str()))
            .collect()
    }

    fn key_for(event: &EventName) -> &str {
        match event {
            EventName::Initialization => INIT_RULE,
            EventName::Transition(name) => name,
        }
    }

    /// Rule for `event`: exact name, then alias, then default.
    pub fn resolve(&self, event: &EventName) -> &RuleDescriptor {
        let key = Self::key_for(event);
        self.rules
            .get(key)
            .or_else(|| self.aliases.get(key).and_then(|target| self.rules.get(target)))
            .unwrap_or_else(|| self.default_rule())
    }

    pub fn default_rule(&self) -> &RuleDescriptor {
        static FALLBACK: std::sync::OnceLock<RuleDescriptor> = std::sync::OnceLock::new();
        self.rules.get(DEFAULT_RULE).unwrap_or_else(|| {
            FALLBACK.get_or_init(|| {
                RuleDescriptor::new(DEFAULT_RULE, &["Repair state inconsistency."])
            })
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_alias_default() {
        let book = RuleBook::builtin();
        assert_eq!(
            book.resolve(&EventName::transition("promote_to_coordinator")).name,
            "promote_to_coordinator"
        );
        assert_eq!(
            book.resolve(&EventName::transition("receive_coordinator_message_from_NODE3"))
                .name,
            "receive_coordinator_message"
        );
        assert_eq!(book.resolve(&EventName::transition("heartbeat")).name, "default");
        assert_eq!(book.resolve(&EventName::Initialization).name, "init");
    }

    #[test]
    fn test_rule_text_is_numbered() {
        let rule = RuleDescriptor::new("r", &["first", "second"]);
        assert_eq!(rule.text(), "1. first\n2. second");
    }

    #[test]
    fn test_custom_rule_overrides_builtin() {
        let book = RuleBook::builtin().with_rule(RuleDescriptor::new("default", &["be brief"]));
        assert_eq!(book.resolve(&EventName::transition("x")).text(), "1. be brief");
    }

    #[test]
    fn test_dangling_alias_falls_back_to_default() {
        let book = RuleBook::builtin().with_alias("elect", "missing_rule");
        assert_eq!(book.dangling_aliases(), vec![("elect", "missing_rule")]);
        assert_eq!(book.resolve(&EventName::transition("elect")).name, "default");
    }

    #[test]
    fn test_builtin_has_no_dangling_aliases() {
        assert!(RuleBook::builtin().dangling_aliases().is_empty());
        assert_eq!(RuleBook::builtin().len(), 4);
    }
}
