// src/telemetry/mod.rs
// Fire-and-forget classification telemetry

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Hard cap on the query preview carried in telemetry. PII hygiene contract
/// with downstream consumers: never ship more of the raw query than this.
pub const QUERY_PREVIEW_MAX_CHARS: usize = 80;

/// Truncates a query to the preview cap on a character boundary.
pub fn preview(query: &str) -> String {
    query.chars().take(QUERY_PREVIEW_MAX_CHARS).collect()
}

/// Marker recorded as the execution path when `deterministic_only` mode
/// refuses a query.
pub const PATH_REJECTED: &str = "rejected";

/// One classification, as emitted to the audit/tuning pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationEvent {
    pub timestamp: DateTime<Utc>,
    pub query_preview: String,
    pub intent: String,
    pub confidence: f32,
    pub patterns_matched: usize,
    /// Chosen path, or [`PATH_REJECTED`] for strict-mode refusals.
    pub execution_path: String,
    pub delegated: bool,
    pub elapsed_micros: u64,
}

/// Receives classification events. Implementations must be non-blocking and
/// must never fail: a broken sink loses events, not classifications.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: ClassificationEvent);
}

/// Discards everything. Default sink for embedders that wire their own.
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: ClassificationEvent) {}
}

/// Logs each event through `tracing` at info level.
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn record(&self, event: ClassificationEvent) {
        info!(
            intent = %event.intent,
            confidence = event.confidence,
            patterns = event.patterns_matched,
            path = %event.execution_path,
            delegated = event.delegated,
            elapsed_micros = event.elapsed_micros,
            preview = %event.query_preview,
            "classification"
        );
    }
}

/// Forwards events over a bounded channel to an async consumer. A full
/// channel drops the event rather than blocking the classify path.
pub struct ChannelTelemetry {
    tx: mpsc::Sender<ClassificationEvent>,
}

impl ChannelTelemetry {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ClassificationEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelTelemetry {
    fn record(&self, event: ClassificationEvent) {
        if let Err(e) = self.tx.try_send(event) {
            debug!("dropping telemetry event: {}", e);
        }
    }
}
