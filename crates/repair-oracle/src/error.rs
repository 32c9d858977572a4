//! Error types for repair-oracle

use thiserror::Error;

/// Errors an oracle call can end with.
///
/// A repair pass treats every variant as "no repair produced" for the
/// current (assertion, event) pair.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Credentials or endpoint missing
    #[error("repair oracle is not configured: {0}")]
    NotConfigured(String),

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("oracle API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response could not be decoded
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// No usable text in the response
    #[error("oracle returned no code")]
    EmptyResponse,

    /// The call did not finish in time
    #[error("oracle call timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, OracleError>;
