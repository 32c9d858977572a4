//! Repair-Oracle: the code-proposal side of CSP# model repair
//!
//! ## Layer 1 - External services
//!
//! The oracle is an explicit value built once and passed by reference to
//! every repair pass. Failures never abort a pass: callers treat any
//! [`OracleError`] as "no repair produced".
//!
//! ## Key Components
//!
//! - `RepairOracle`: async trait implemented by every oracle
//! - `RepairRequest`: event, code, rule, assertion and scope of one attempt
//! - `compose_prompt` / `clean_response`: prompt text and fence stripping
//! - `GeminiOracle`: HTTP client for the Gemini `generateContent` API
//! - `fakes`: deterministic in-memory oracles

mod error;
pub mod fakes;
pub mod gemini;
mod oracle;
pub mod prompt;
mod request;

pub use error::{OracleError, Result};
pub use gemini::{GeminiOracle, OracleConfig};
pub use oracle::RepairOracle;
pub use prompt::{clean_response, compose_prompt};
pub use request::{RepairRequest, RepairScope};
