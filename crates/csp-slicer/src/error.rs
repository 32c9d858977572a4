//! Error types for csp-slicer

use thiserror::Error;

/// Errors produced while slicing or splicing a model.
///
/// Every variant is non-fatal for a repair pass: the caller skips the
/// affected unit of work and leaves the working model untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    /// No region exists for the requested event in the current text
    #[error("region not found for event '{event}'")]
    RegionNotFound { event: String },

    /// A `#define` line did not have the `NAME (EXPRESSION);` shape
    #[error("malformed macro definition at line {line}: {text}")]
    MalformedMacro { line: usize, text: String },

    /// A replacement would break brace balance or arrow structure
    #[error("replacement rejected for event '{event}': {reason}")]
    SanitizationRejected { event: String, reason: String },

    /// The working text no longer matches the region captured earlier
    #[error("region for event '{event}' is stale; re-extract before splicing")]
    StaleRegion { event: String },
}

/// Result type for slicing operations
pub type Result<T> = std::result::Result<T, SliceError>;
