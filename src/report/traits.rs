//! Report delivery seam.

use anyhow::Result;
use async_trait::async_trait;

use super::SessionReport;

/// Delivers one finished report to the collection endpoint.
///
/// Best-effort: a failed delivery is logged by the dispatcher and never
/// retried, and a non-2xx response still counts as delivered.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &SessionReport) -> Result<()>;

    /// The name of this sink implementation.
    fn name(&self) -> &str;
}
