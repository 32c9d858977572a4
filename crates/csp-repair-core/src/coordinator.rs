//! The per-model repair pass.
//!
//! For each failure record, in order, the assertion is analysed against the
//! *current* working text, every target region is re-extracted, sent to the
//! oracle, sanitized and spliced. A failed unit of work leaves the working
//! text untouched; later units always see earlier edits.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use csp_slicer::{
    analyze_assertion, extract_region, sanitize_with, splice, EventName, KeywordSet, Region,
    SliceError,
};
use pat_verifier::FailureRecord;
use repair_oracle::{clean_response, RepairOracle, RepairRequest, RepairScope};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::config::{RepairConfig, RepairMode};
use crate::obs::{
    emit_patch_applied, emit_patch_rejected, emit_repair_finished, emit_repair_started,
    repair_span,
};
use crate::report::{sha256_hex, AttemptOutcome, RepairAttempt, RepairReport};
use crate::rules::RuleBook;
use crate::throttle::Throttle;

/// Repaired text plus what happened on the way.
#[derive(Debug, Clone)]
pub struct ModelRepair {
    pub text: String,
    pub report: RepairReport,
}

/// Drives one repair pass per model against a shared oracle.
pub struct RepairCoordinator<'a> {
    oracle: &'a dyn RepairOracle,
    rules: &'a RuleBook,
    mode: RepairMode,
    keywords: KeywordSet,
    throttle: Option<&'a Throttle>,
}

impl<'a> RepairCoordinator<'a> {
    pub fn new(oracle: &'a dyn RepairOracle, rules: &'a RuleBook, config: &RepairConfig) -> Self {
        Self {
            oracle,
            rules,
            mode: config.mode,
            keywords: config.keywords(),
            throttle: None,
        }
    }

    /// Space oracle calls through `throttle`.
    pub fn with_throttle(mut self, throttle: &'a Throttle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Repair `source` for `records`, in record order.
    ///
    /// Never fails: every per-unit problem is recorded in the report and the
    /// working text is carried forward unchanged for that unit.
    pub async fn repair_model(
        &self,
        model: &Path,
        source: &str,
        records: &[FailureRecord],
    ) -> ModelRepair {
        let run_id = Uuid::new_v4();
        let span = repair_span(&model.display().to_string(), &run_id.to_string());
        self.run_pass(run_id, model, source, records)
            .instrument(span)
            .await
    }

    async fn run_pass(
        &self,
        run_id: Uuid,
        model: &Path,
        source: &str,
        records: &[FailureRecord],
    ) -> ModelRepair {
        let run = run_id.to_string();
        let model_name = model.display().to_string();
        let started_at = Utc::now();
        emit_repair_started(&run, &model_name, records.len());

        let mut working = source.to_string();
        let mut attempts = Vec::new();
        let mut attempted: HashSet<(String, EventName)> = HashSet::new();

        for record in records {
            let analysis = analyze_assertion(&record.assertion, &working, &self.keywords);
            info!(
                assertion = %record.assertion,
                expanded = %analysis.expanded,
                variables = ?analysis.variables,
                targets = analysis.events.len(),
                "repair targets located"
            );

            for event in analysis.events {
                if !attempted.insert((record.assertion.clone(), event.clone())) {
                    debug!(assertion = %record.assertion, region = %event, "already attempted");
                    continue;
                }
                let rule = self.rules.resolve(&event);
                let outcome = self
                    .attempt(&run, &mut working, &record.assertion, &event)
                    .await;
                attempts.push(RepairAttempt {
                    assertion: record.assertion.clone(),
                    event,
                    rule: rule.name.clone(),
                    outcome,
                });
            }
        }

        let finished_at = Utc::now();
        let report = RepairReport {
            run_id,
            model: model.to_path_buf(),
            oracle: self.oracle.name().to_string(),
            mode: self.mode,
            started_at,
            finished_at,
            input_sha256: sha256_hex(source),
            output_sha256: sha256_hex(&working),
            assertions: records.iter().map(|r| r.assertion.clone()).collect(),
            attempts,
        };
        emit_repair_finished(
            &run,
            &model_name,
            report.applied(),
            report.attempts.len(),
            report.duration_ms(),
        );

        ModelRepair {
            text: working,
            report,
        }
    }

    fn region_for(&self, working: &str, event: &EventName) -> Result<Region, SliceError> {
        match self.mode {
            RepairMode::Region => extract_region(working, event),
            RepairMode::WholeFile => {
                // The event must still exist, even though the whole text is sent.
                extract_region(working, event)?;
                Ok(Region::whole_model(working))
            }
        }
    }

    /// One (assertion, event) unit. Mutates `working` only on success.
    async fn attempt(
        &self,
        run: &str,
        working: &mut String,
        assertion: &str,
        event: &EventName,
    ) -> AttemptOutcome {
        let region = match self.region_for(working, event) {
            Ok(region) => region,
            Err(e) => {
                emit_patch_rejected(run, event.as_str(), "region_not_found", &e);
                return AttemptOutcome::RegionNotFound;
            }
        };

        let rule = self.rules.resolve(event);
        let request = match self.mode.scope() {
            RepairScope::Region => {
                RepairRequest::region(event.as_str(), &region.full_text, rule.text(), assertion)
            }
            RepairScope::WholeModel => {
                RepairRequest::whole_model(event.as_str(), &region.full_text, rule.text(), assertion)
            }
        };

        if let Some(throttle) = self.throttle {
            throttle.acquire().await;
        }
        let raw = match self.oracle.propose(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                emit_patch_rejected(run, event.as_str(), "oracle_failed", &e);
                return AttemptOutcome::OracleFailed {
                    error: e.to_string(),
                };
            }
        };

        let replacement = sanitize_with(&clean_response(&raw), self.mode.terminator_policy());
        if replacement == region.full_text {
            debug!(region = %event, "oracle returned the region unchanged");
        }

        match splice(working, &region, &replacement) {
            Ok(outcome) => {
                emit_patch_applied(run, assertion, event.as_str(), outcome.unique);
                *working = outcome.text;
                AttemptOutcome::Applied {
                    unique: outcome.unique,
                    continuation_replaced: outcome.continuation_replaced,
                }
            }
            Err(e) => {
                warn!(region = %event, error = %e, "keeping original region");
                emit_patch_rejected(run, event.as_str(), "rejected", &e);
                AttemptOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }
}
