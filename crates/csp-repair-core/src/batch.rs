//! Batch repair of model files.
//!
//! Models are independent: each gets its own coordinator pass on a tokio
//! task, bounded by a semaphore. Oracle calls from all tasks share one
//! throttle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pat_verifier::{records_for, FailureRecord};
use repair_oracle::RepairOracle;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};

use crate::config::RepairConfig;
use crate::coordinator::RepairCoordinator;
use crate::error::{RepairError, Result};
use crate::report::RepairReport;
use crate::rules::RuleBook;
use crate::throttle::Throttle;

/// Model files in `dir` with `extension`, sorted by path.
pub fn discover_models(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut models = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            models.push(path);
        }
    }
    models.sort();
    Ok(models)
}

/// Where one model's repair ended up.
#[derive(Debug, Clone, Serialize)]
pub struct ModelOutcome {
    pub model: PathBuf,
    pub repaired: PathBuf,
    pub report_path: Option<PathBuf>,
    pub report: RepairReport,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Successful passes, in input order.
    pub repaired: Vec<ModelOutcome>,
    /// Models whose pass aborted, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn applied(&self) -> usize {
        self.repaired.iter().map(|m| m.report.applied()).sum()
    }
}

/// Shared state for repairing many models with one oracle.
pub struct BatchRepairer {
    config: RepairConfig,
    rules: RuleBook,
    oracle: Arc<dyn RepairOracle>,
    throttle: Throttle,
}

impl BatchRepairer {
    pub fn new(config: RepairConfig, oracle: Arc<dyn RepairOracle>) -> Self {
        let rules = config.rule_book();
        let throttle = Throttle::from_millis(config.oracle_delay_ms);
        Self {
            config,
            rules,
            oracle,
            throttle,
        }
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Repair one file and write `<output_dir>/<prefix><name>`.
    ///
    /// Only records that apply to `model` are used. The output is written
    /// even when nothing changed, so every input has a repaired counterpart.
    #[instrument(skip_all, fields(model = %model.display()))]
    pub async fn repair_file(&self, model: &Path, records: &[FailureRecord]) -> Result<ModelOutcome> {
        let source = match tokio::fs::read_to_string(model).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepairError::ModelNotFound(model.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let applicable: Vec<FailureRecord> =
            records_for(records, model).into_iter().cloned().collect();
        if applicable.is_empty() {
            info!("no failure records for this model");
        }

        let coordinator =
            RepairCoordinator::new(self.oracle.as_ref(), &self.rules, &self.config)
                .with_throttle(&self.throttle);
        let repair = coordinator.repair_model(model, &source, &applicable).await;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let repaired = self.config.repaired_path(model);
        tokio::fs::write(&repaired, &repair.text).await?;

        let report_path = if self.config.write_reports {
            let path = RepairConfig::report_path(&repaired);
            repair.report.write(&path)?;
            Some(path)
        } else {
            None
        };

        info!(
            repaired = %repaired.display(),
            applied = repair.report.applied(),
            changed = repair.report.changed(),
            "repaired model saved"
        );
        Ok(ModelOutcome {
            model: model.to_path_buf(),
            repaired,
            report_path,
            report: repair.report,
        })
    }

    /// Repair `models` concurrently, at most `max_concurrency` at a time.
    ///
    /// A failure aborts only its own model.
    pub async fn repair_all(
        self: &Arc<Self>,
        models: Vec<PathBuf>,
        records: Arc<Vec<FailureRecord>>,
    ) -> BatchSummary {
        let sem = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = Vec::with_capacity(models.len());

        for model in models {
            let this = Arc::clone(self);
            let records = Arc::clone(&records);
            let sem = Arc::clone(&sem);
            tasks.push(tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let result = this.repair_file(&model, &records).await;
                (model, result)
            }));
        }

        let mut summary = BatchSummary::default();
        for joined in futures::future::join_all(tasks).await {
            match joined {
                Ok((_, Ok(outcome))) => summary.repaired.push(outcome),
                Ok((model, Err(e))) => {
                    error!(model = %model.display(), error = %e, "model repair aborted");
                    summary.failed.push((model, e.to_string()));
                }
                Err(e) => warn!(error = %e, "repair task did not complete"),
            }
        }
        summary
    }
}
