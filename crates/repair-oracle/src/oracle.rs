//! The oracle seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::RepairRequest;

/// Something that proposes replacement code for a region.
///
/// Implementations are constructed once and shared by reference across a
/// batch; they must not rely on per-call global state.
#[async_trait]
pub trait RepairOracle: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Propose replacement code. The answer is raw: callers clean and
    /// sanitize it before splicing.
    async fn propose(&self, request: &RepairRequest) -> Result<String>;
}
