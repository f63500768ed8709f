// src/feedback/mod.rs
// Feedback ingestion: right/wrong verdicts collected for offline tuning

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::telemetry::preview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackVerdict {
    Correct,
    Incorrect,
}

/// One human/UI verdict on a past classification. Never consulted during
/// classification; purely input to offline pattern tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Utc>,
    pub query_preview: String,
    pub predicted_intent: String,
    pub verdict: FeedbackVerdict,
    /// The intent the reporter believes was right, when they named one.
    pub corrected_intent: Option<String>,
}

impl FeedbackRecord {
    pub fn new(
        query: &str,
        predicted_intent: &str,
        verdict: FeedbackVerdict,
        corrected_intent: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            query_preview: preview(query),
            predicted_intent: predicted_intent.to_string(),
            verdict,
            corrected_intent,
        }
    }
}

/// Accepts feedback records. Like telemetry, submission must never fail the
/// caller.
pub trait FeedbackSink: Send + Sync {
    fn submit(&self, record: FeedbackRecord);
}

/// In-memory feedback collector with JSONL export for the tuning pipeline.
#[derive(Debug, Default)]
pub struct FeedbackLog {
    entries: Mutex<Vec<FeedbackRecord>>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<FeedbackRecord> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Writes all collected records as JSON lines. Returns the record count.
    pub fn export_jsonl(&self, path: &Path) -> Result<usize> {
        let records = self.snapshot();
        let file = File::create(path)
            .with_context(|| format!("creating feedback export at {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in &records {
            serde_json::to_writer(&mut writer, record).context("serializing feedback record")?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!(count = records.len(), path = %path.display(), "exported feedback log");
        Ok(records.len())
    }
}

impl FeedbackSink for FeedbackLog {
    fn submit(&self, record: FeedbackRecord) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_collects_submissions() {
        let log = FeedbackLog::new();
        assert!(log.is_empty());
        log.submit(FeedbackRecord::new(
            "who is alice?",
            "people_lookup",
            FeedbackVerdict::Correct,
            None,
        ));
        log.submit(FeedbackRecord::new(
            "show me the agenda",
            "project_search",
            FeedbackVerdict::Incorrect,
            Some("session_search".to_string()),
        ));
        assert_eq!(log.len(), 2);
        let snapshot = log.snapshot();
        assert_eq!(snapshot[1].corrected_intent.as_deref(), Some("session_search"));
    }

    #[test]
    fn test_record_preview_is_capped() {
        let long = "a".repeat(400);
        let record = FeedbackRecord::new(&long, "help", FeedbackVerdict::Correct, None);
        assert_eq!(
            record.query_preview.chars().count(),
            crate::telemetry::QUERY_PREVIEW_MAX_CHARS
        );
    }

    #[test]
    fn test_export_jsonl_round_trip() {
        let log = FeedbackLog::new();
        log.submit(FeedbackRecord::new(
            "where is the keynote",
            "location_lookup",
            FeedbackVerdict::Correct,
            None,
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.jsonl");
        let written = log.export_jsonl(&path).unwrap();
        assert_eq!(written, 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: FeedbackRecord = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.predicted_intent, "location_lookup");
        assert_eq!(parsed.verdict, FeedbackVerdict::Correct);
    }
}
