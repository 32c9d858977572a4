//! PAT-Verifier: model-checker integration for CSP# model repair
//!
//! Runs the PAT console on model files, turns its report into
//! [`FailureRecord`]s and persists them as a JSON failure trace.
//!
//! ## Layer 1 - External services
//!
//! ## Key Components
//!
//! - `Verifier`: spawns the checker with a timeout and parses its report
//! - `VerifierConfig`: executable, launcher, argument template, timeout
//! - `parse_report`: failed-assertion extraction
//! - `load_trace` / `write_trace`: trace file I/O

mod config;
mod error;
mod record;
mod report;
mod runner;
pub mod trace;

pub use config::{VerifierConfig, DEFAULT_EXECUTABLE, DEFAULT_TIMEOUT_SECS};
pub use error::{Result, VerifierError};
pub use record::{records_for, FailureRecord, FailureStatus};
pub use report::parse_report;
pub use runner::{VerificationOutcome, VerificationRun, Verifier};
pub use trace::{load_trace, write_trace, DEFAULT_TRACE_FILE};
