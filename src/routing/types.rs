// src/routing/types.rs
// Shared types for the routing pipeline

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entities::EntitySlot;

/// Sentinel intent name for queries nothing in the catalogue recognized.
pub const UNCLASSIFIED: &str = "unclassified";

/// Where the event is in its lifecycle, as reported by the scheduling
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Pre,
    During,
    Post,
}

/// Context flags supplied by the caller alongside the query text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryContext {
    /// Whether an event is currently inside its active window.
    pub event_active: bool,
    pub phase: EventPhase,
}

impl QueryContext {
    pub fn new(event_active: bool, phase: EventPhase) -> Self {
        Self { event_active, phase }
    }

    /// Context for a quiet period outside any event.
    pub fn inactive() -> Self {
        Self {
            event_active: false,
            phase: EventPhase::Pre,
        }
    }
}

/// Outcome of classifying one query.
///
/// Created fresh per request and consumed immediately; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Winning intent name, or [`UNCLASSIFIED`].
    pub intent: String,
    /// Confidence in [0.0, 0.95]. Exactly 0.0 iff the intent is unclassified.
    pub confidence: f32,
    /// Extracted entity slots. Absent slots are missing keys, never
    /// placeholders.
    pub matched_entities: BTreeMap<EntitySlot, String>,
    /// How many pattern rules fired, kept even on a floor downgrade so
    /// pattern coverage can be audited.
    pub patterns_matched: usize,
}

impl ClassificationResult {
    pub fn unclassified(
        matched_entities: BTreeMap<EntitySlot, String>,
        patterns_matched: usize,
    ) -> Self {
        Self {
            intent: UNCLASSIFIED.to_string(),
            confidence: 0.0,
            matched_entities,
            patterns_matched,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.intent == UNCLASSIFIED
    }
}

/// Execution path chosen for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionPath {
    /// Resolve against structured data with zero model calls.
    Deterministic,
    /// Blend a local partial result with a model call.
    LlmAssisted,
    /// Hand the query entirely to a model.
    FullModel,
}

impl ExecutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPath::Deterministic => "deterministic",
            ExecutionPath::LlmAssisted => "llmAssisted",
            ExecutionPath::FullModel => "fullModel",
        }
    }
}

/// Routing decision for a classified query. Dispatch to the chosen path is
/// the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub path: ExecutionPath,
    /// Set when hybrid mode hands the query to the external multi-agent
    /// orchestrator instead of the plain model call.
    pub delegate: bool,
    /// The threshold comparison that produced this path, for audit.
    pub rationale: String,
}

/// UI-triggered actions that carry their target intent directly and bypass
/// the classifier. Closed set matched against the catalogue's intent names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectAction {
    ShowSchedule,
    BrowseCategories,
    RecordingStatus,
    SubmitFeedback,
    ExportResults,
}

impl DirectAction {
    /// The catalogue intent this action resolves to.
    pub fn intent_name(&self) -> &'static str {
        match self {
            DirectAction::ShowSchedule => "time_based_schedule",
            DirectAction::BrowseCategories => "category_browse",
            DirectAction::RecordingStatus => "recording_status",
            DirectAction::SubmitFeedback => "feedback_submit",
            DirectAction::ExportResults => "export_results",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclassified_result_has_zero_confidence() {
        let result = ClassificationResult::unclassified(BTreeMap::new(), 0);
        assert!(result.is_unclassified());
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_entities.is_empty());
    }

    #[test]
    fn test_execution_path_serializes_camel_case() {
        let json = serde_json::to_string(&ExecutionPath::LlmAssisted).unwrap();
        assert_eq!(json, "\"llmAssisted\"");
        assert_eq!(ExecutionPath::FullModel.as_str(), "fullModel");
    }

    #[test]
    fn test_direct_actions_name_real_intents() {
        let catalogue = crate::routing::catalogue::default_catalogue();
        for action in [
            DirectAction::ShowSchedule,
            DirectAction::BrowseCategories,
            DirectAction::RecordingStatus,
            DirectAction::SubmitFeedback,
            DirectAction::ExportResults,
        ] {
            assert!(
                catalogue.lookup(action.intent_name()).is_some(),
                "direct action {action:?} points at a missing intent"
            );
        }
    }
}
