//! Model-checker process execution.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::VerifierConfig;
use crate::error::{Result, VerifierError};
use crate::record::FailureRecord;
use crate::report::parse_report;

/// Marker the checker prints when its runtime cannot load a module.
const LOAD_FAILURE_MARKER: &str = "Could not load";

/// Result of verifying one model.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub model: PathBuf,
    pub failures: Vec<FailureRecord>,
    /// Whether the checker produced a report file.
    pub report_found: bool,
    /// Exit code, -1 when killed by a signal.
    pub exit_code: i32,
    /// Loader complaints and stderr output worth surfacing.
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl VerificationOutcome {
    pub fn passed(&self) -> bool {
        self.report_found && self.failures.is_empty()
    }
}

/// Outcome of verifying several models.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationRun {
    pub outcomes: Vec<VerificationOutcome>,
    /// Models whose verification aborted, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl VerificationRun {
    /// All failure records in model order, then report order.
    pub fn records(&self) -> Vec<FailureRecord> {
        self.outcomes
            .iter()
            .flat_map(|o| o.failures.iter().cloned())
            .collect()
    }
}

/// Runs the external checker on model files.
#[derive(Debug, Clone)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Fails with [`VerifierError::Unavailable`] when the executable is missing.
    pub fn check_available(&self) -> Result<()> {
        if self.config.executable.exists() {
            Ok(())
        } else {
            Err(VerifierError::Unavailable(self.config.executable.clone()))
        }
    }

    /// Verify one model.
    ///
    /// A missing report is a warning, not an error: the outcome carries no
    /// failures and `report_found == false`. The report is deleted after it
    /// has been parsed.
    pub async fn verify(&self, model: &Path) -> Result<VerificationOutcome> {
        self.check_available()?;

        let model_abs = std::path::absolute(model)?;
        let report = VerifierConfig::report_path(&model_abs);
        let (program, args) = self.config.command_line(&model_abs, &report);
        info!(model = %model.display(), "verifying model");
        debug!(program = %program, ?args, "verifier command");

        let start = Instant::now();
        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| VerifierError::Spawn {
                program: program.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => output?,
            Err(_) => {
                // The child is killed on drop; a partial report is useless.
                remove_report(&report);
                warn!(
                    model = %model.display(),
                    timeout_secs = self.config.timeout_secs,
                    "verifier timed out"
                );
                return Err(VerifierError::Timeout {
                    model: model.to_path_buf(),
                    seconds: self.config.timeout_secs,
                });
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut warnings = Vec::new();
        if stdout.contains(LOAD_FAILURE_MARKER) {
            warnings.push(stdout.trim().to_string());
        }
        if !stderr.trim().is_empty() {
            warnings.push(stderr.trim().to_string());
        }
        for warning in &warnings {
            warn!(model = %model.display(), output = %warning, "verifier initialization warnings");
        }

        let (failures, report_found) = match tokio::fs::read(&report).await {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                let failures = parse_report(&content, model);
                remove_report(&report);
                (failures, true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    model = %model.display(),
                    exit_code,
                    "verifier did not create a report; it may have crashed"
                );
                (Vec::new(), false)
            }
            Err(e) => return Err(e.into()),
        };

        for failure in &failures {
            info!(model = %model.display(), assertion = %failure.assertion, "assertion violated");
        }
        if report_found && failures.is_empty() {
            info!(model = %model.display(), "model satisfies all assertions");
        }

        Ok(VerificationOutcome {
            model: model.to_path_buf(),
            failures,
            report_found,
            exit_code,
            warnings,
            duration_ms,
        })
    }

    /// Verify models one after another.
    ///
    /// A timeout counts as zero failures for that model. Any other error
    /// aborts only that model and is collected in [`VerificationRun::errors`].
    pub async fn verify_all(&self, models: &[PathBuf]) -> VerificationRun {
        let mut run = VerificationRun::default();
        for model in models {
            match self.verify(model).await {
                Ok(outcome) => run.outcomes.push(outcome),
                Err(VerifierError::Timeout { model, seconds }) => {
                    run.outcomes.push(VerificationOutcome {
                        model,
                        failures: Vec::new(),
                        report_found: false,
                        exit_code: -1,
                        warnings: vec![format!("timed out after {}s", seconds)],
                        duration_ms: seconds * 1000,
                    });
                }
                Err(e) => {
                    error!(model = %model.display(), error = %e, "verification aborted");
                    run.errors.push((model.clone(), e.to_string()));
                }
            }
        }
        run
    }
}

fn remove_report(report: &Path) {
    if let Err(e) = std::fs::remove_file(report) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(report = %report.display(), error = %e, "failed to remove verifier report");
        }
    }
}
