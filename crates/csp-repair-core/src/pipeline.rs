//! Verify → repair → re-verify over a models directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pat_verifier::{write_trace, VerificationRun, Verifier};
use serde::Serialize;
use tracing::info;

use crate::batch::{discover_models, BatchRepairer, BatchSummary};
use crate::error::{RepairError, Result};

/// Verify `models` and persist the failure trace at `trace_path`.
///
/// The trace is always written; a clean run writes `[]`.
pub async fn verify_and_record(
    verifier: &Verifier,
    models: &[PathBuf],
    trace_path: &Path,
) -> Result<VerificationRun> {
    verifier.check_available()?;
    let run = verifier.verify_all(models).await;
    write_trace(trace_path, &run.records())?;
    Ok(run)
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub models: Vec<PathBuf>,
    pub verification: VerificationRun,
    pub batch: BatchSummary,
    /// Verification of the repaired outputs, when requested.
    pub reverification: Option<VerificationRun>,
}

impl PipelineSummary {
    /// Failures still reported on repaired outputs.
    pub fn remaining_failures(&self) -> Option<usize> {
        self.reverification.as_ref().map(|run| run.records().len())
    }
}

/// Run the full pipeline on the configured models directory.
pub async fn run_pipeline(
    verifier: &Verifier,
    repairer: &Arc<BatchRepairer>,
    reverify: bool,
) -> Result<PipelineSummary> {
    let config = repairer.config();
    let models = discover_models(&config.models_dir, config.extension())?;
    if models.is_empty() {
        return Err(RepairError::Config(format!(
            "no .{} files found in {}",
            config.extension(),
            config.models_dir.display()
        )));
    }
    info!(models = models.len(), dir = %config.models_dir.display(), "pipeline started");

    let verification = verify_and_record(verifier, &models, &config.trace_file).await?;
    let records = Arc::new(verification.records());
    info!(failures = records.len(), "verification finished");

    let batch = repairer.repair_all(models.clone(), records).await;

    let reverification = if reverify {
        let repaired: Vec<PathBuf> = batch.repaired.iter().map(|m| m.repaired.clone()).collect();
        let run = verifier.verify_all(&repaired).await;
        info!(remaining = run.records().len(), "re-verification finished");
        Some(run)
    } else {
        None
    };

    Ok(PipelineSummary {
        models,
        verification,
        batch,
        reverification,
    })
}
