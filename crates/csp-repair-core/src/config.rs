//! Repair configuration.
//!
//! Everything has a default, so an absent or partial TOML file is valid:
//!
//! ```toml
//! output_prefix = "repaired_"
//! mode = "region"
//! max_concurrency = 2
//! oracle_delay_ms = 500
//! extra_keywords = ["one_coordinator"]
//!
//! [rules.elect]
//! guidance = ["Set leader and role in one atomic block."]
//!
//! [aliases]
//! elect_from_NODE2 = "elect"
//!
//! [verifier]
//! executable = "/opt/pat/PAT3.Console.exe"
//! timeout_secs = 60
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csp_slicer::{KeywordSet, TerminatorPolicy};
use pat_verifier::VerifierConfig;
use repair_oracle::RepairScope;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RepairError, Result};
use crate::rules::{RuleBook, RuleDescriptor};

/// What the oracle is shown and what its answer replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    /// Only the extracted region.
    #[default]
    Region,
    /// The whole model text.
    WholeFile,
}

impl RepairMode {
    pub fn scope(self) -> RepairScope {
        match self {
            RepairMode::Region => RepairScope::Region,
            RepairMode::WholeFile => RepairScope::WholeModel,
        }
    }

    /// Whole models keep the `;` that ends a process definition.
    pub fn terminator_policy(self) -> TerminatorPolicy {
        match self {
            RepairMode::Region => TerminatorPolicy::EveryTransition,
            RepairMode::WholeFile => TerminatorPolicy::BeforeChoice,
        }
    }
}

impl std::fmt::Display for RepairMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairMode::Region => write!(f, "region"),
            RepairMode::WholeFile => write!(f, "whole_file"),
        }
    }
}

/// Repair configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Directory scanned for input models
    pub models_dir: PathBuf,
    /// Directory receiving repaired models (created if absent)
    pub output_dir: PathBuf,
    /// Failure trace written by verification and read by repair
    pub trace_file: PathBuf,
    /// Prefix of repaired file names
    pub output_prefix: String,
    /// Model file extension, without the dot
    pub model_extension: String,
    pub mode: RepairMode,
    /// Model files repaired at the same time
    pub max_concurrency: usize,
    /// Minimum spacing between oracle calls, in milliseconds
    pub oracle_delay_ms: u64,
    /// Identifiers never treated as state variables, on top of the defaults
    pub extra_keywords: Vec<String>,
    /// Write `<repaired>.report.json` next to each repaired model
    pub write_reports: bool,
    /// Extra or overriding rules, keyed by event name
    pub rules: BTreeMap<String, RuleDescriptor>,
    /// Event name → rule name
    pub aliases: BTreeMap<String, String>,
    pub verifier: VerifierConfig,
}

impl Default for RepairConfig {
    fn default() -> Self {
        RepairConfig {
            models_dir: PathBuf::from("models"),
            output_dir: PathBuf::from("repaired_models"),
            trace_file: PathBuf::from(pat_verifier::DEFAULT_TRACE_FILE),
            output_prefix: "repaired_".to_string(),
            model_extension: "csp".to_string(),
            mode: RepairMode::Region,
            max_concurrency: 4,
            oracle_delay_ms: 0,
            extra_keywords: Vec::new(),
            write_reports: true,
            rules: BTreeMap::new(),
            aliases: BTreeMap::new(),
            verifier: VerifierConfig::from_env(),
        }
    }
}

impl RepairConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RepairConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RepairError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(RepairError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.model_extension.trim_start_matches('.').is_empty() {
            return Err(RepairError::Config("model_extension is empty".to_string()));
        }
        if self.output_prefix.contains(std::path::MAIN_SEPARATOR) {
            return Err(RepairError::Config(format!(
                "output_prefix '{}' must not contain a path separator",
                self.output_prefix
            )));
        }
        Ok(())
    }

    /// Extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.model_extension.trim_start_matches('.')
    }

    /// Variable exclusion set: defaults plus `extra_keywords`.
    pub fn keywords(&self) -> KeywordSet {
        KeywordSet::with_extra(self.extra_keywords.iter().cloned())
    }

    /// Built-in rules extended with the configured rules and aliases.
    pub fn rule_book(&self) -> RuleBook {
        let mut book = RuleBook::builtin();
        for (name, rule) in &self.rules {
            book.insert(RuleDescriptor {
                name: name.clone(),
                guidance: rule.guidance.clone(),
            });
        }
        for (event, rule) in &self.aliases {
            book.alias(event, rule);
        }
        for (alias, target) in book.dangling_aliases() {
            warn!(alias, target, "rule alias points at an unknown rule; default applies");
        }
        book
    }

    /// Output path for `model`: `<output_dir>/<prefix><file name>`.
    pub fn repaired_path(&self, model: &Path) -> PathBuf {
        let name = model
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_dir
            .join(format!("{}{}", self.output_prefix, name))
    }

    /// Report path for a repaired model: `<repaired>.report.json`.
    pub fn report_path(repaired: &Path) -> PathBuf {
        let mut name = repaired.as_os_str().to_os_string();
        name.push(".report.json");
        PathBuf::from(name)
    }
}
