//! CSP-Repair-Core: counterexample-guided repair of CSP# process models
//!
//! Ties the slicer, the oracle and the verifier together: each failed
//! assertion is traced to the regions that can influence it, those regions
//! are rewritten by the oracle one at a time, and every accepted rewrite is
//! visible to the next.
//!
//! ## Layer 2 - Orchestration
//!
//! ## Key Components
//!
//! - `RepairCoordinator`: sequential pass over one model's failure records
//! - `BatchRepairer`: bounded-concurrency repair of many model files
//! - `RuleBook`: event → rule dispatch with aliases and a default
//! - `RepairConfig`: TOML-backed configuration
//! - `RepairReport`: per-attempt outcomes and content digests
//! - `run_pipeline`: verify, repair, optionally re-verify

pub mod batch;
pub mod config;
pub mod coordinator;
mod error;
pub mod obs;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod telemetry;
pub mod throttle;

pub use batch::{discover_models, BatchRepairer, BatchSummary, ModelOutcome};
pub use config::{RepairConfig, RepairMode};
pub use coordinator::{ModelRepair, RepairCoordinator};
pub use error::{RepairError, Result};
pub use obs::{
    emit_patch_applied, emit_patch_rejected, emit_repair_finished, emit_repair_started,
    repair_span,
};
pub use pipeline::{run_pipeline, verify_and_record, PipelineSummary};
pub use report::{sha256_hex, AttemptOutcome, RepairAttempt, RepairReport};
pub use rules::{RuleBook, RuleDescriptor};
pub use telemetry::init_tracing;
pub use throttle::Throttle;
