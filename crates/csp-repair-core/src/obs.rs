//! Structured lifecycle events for repair passes.
//!
//! - `repair_span` tags everything logged during one model's pass with the
//!   model path and run id
//! - `emit_*` functions log the pass lifecycle with an `event` field

use tracing::{info, warn};

/// Model-scoped span for one pass, meant for `Instrument::instrument`.
///
/// ```ignore
/// run_pass(..).instrument(repair_span("models/leader.csp", &run_id)).await
/// ```
pub fn repair_span(model: &str, run_id: &str) -> tracing::Span {
    tracing::info_span!("csp_repair.model", model = %model, run_id = %run_id)
}

/// Emit event: repair pass started.
pub fn emit_repair_started(run_id: &str, model: &str, records: usize) {
    info!(event = "repair.started", run_id = %run_id, model = %model, records = records);
}

/// Emit event: a replacement was spliced in.
pub fn emit_patch_applied(run_id: &str, assertion: &str, region: &str, unique: bool) {
    info!(
        event = "repair.patch_applied",
        run_id = %run_id,
        assertion = %assertion,
        region = %region,
        unique = unique,
    );
}

/// Emit event: a unit of work produced no patch (warning level).
pub fn emit_patch_rejected(
    run_id: &str,
    region: &str,
    outcome: &str,
    reason: &dyn std::fmt::Display,
) {
    warn!(
        event = "repair.patch_rejected",
        run_id = %run_id,
        region = %region,
        outcome = %outcome,
        reason = %reason,
    );
}

/// Emit event: repair pass finished.
pub fn emit_repair_finished(
    run_id: &str,
    model: &str,
    applied: usize,
    attempts: usize,
    duration_ms: u64,
) {
    info!(
        event = "repair.finished",
        run_id = %run_id,
        model = %model,
        applied = applied,
        attempts = attempts,
        duration_ms = duration_ms,
    );
}
