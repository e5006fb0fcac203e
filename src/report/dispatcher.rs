//! Report dispatch: a bounded queue drained by one worker task.
//!
//! Enqueueing never blocks the turn that triggered it; the worker performs
//! the actual delivery after the turn's response has gone out. There is no
//! retry and no acknowledgment tracking; a failed or dropped delivery is
//! logged and the trigger stays consumed.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::traits::ReportSink;
use super::SessionReport;

/// Delivery timeout for one POST to the collection endpoint.
const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Hands finished reports to a background worker for delivery.
pub struct ReportDispatcher {
    tx: mpsc::Sender<SessionReport>,
}

impl ReportDispatcher {
    /// Start the worker task draining the queue into `sink`.
    pub fn spawn(sink: Arc<dyn ReportSink>, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<SessionReport>(queue_capacity.max(1));
        tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                let session_id = report.session_id.clone();
                match sink.deliver(&report).await {
                    Ok(()) => info!(session = %session_id, sink = sink.name(), "session report delivered"),
                    Err(e) => warn!(
                        session = %session_id,
                        sink = sink.name(),
                        error = %e,
                        "session report delivery failed; report is not retried"
                    ),
                }
            }
        });
        Self { tx }
    }

    /// Queue a report for delivery. Never blocks; if the queue is full the
    /// report is dropped and the drop is logged.
    pub fn dispatch(&self, report: SessionReport) {
        let session_id = report.session_id.clone();
        if self.tx.try_send(report).is_err() {
            warn!(session = %session_id, "report queue full; dropping session report");
        }
    }
}

/// POSTs reports to the configured collection endpoint.
pub struct HttpReportSink {
    client: Client,
    url: String,
}

impl HttpReportSink {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DELIVERY_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn deliver(&self, report: &SessionReport) -> Result<()> {
        let response = self.client.post(&self.url).json(report).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        // The endpoint's answer is recorded, never interpreted.
        info!(%status, body = %crate::providers::sanitize_api_error(&body), "collection endpoint responded");
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}
