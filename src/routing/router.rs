// src/routing/router.rs
// The routing facade: one synchronous entry point per query

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::telemetry::{
    ClassificationEvent, NoopTelemetry, PATH_REJECTED, TelemetrySink, preview,
};

use super::catalogue::{CONFIDENCE_CEILING, IntentCatalogue};
use super::classifier::QueryClassifier;
use super::entities::{ReferenceTables, extract};
use super::strategy::select_path;
use super::types::{
    ClassificationResult, DirectAction, ExecutionPath, QueryContext, RoutingDecision,
};

/// Routes free-text queries and structured direct actions.
///
/// Holds only immutable state (catalogue, reference tables, validated
/// config), so one router can serve arbitrarily many concurrent request
/// tasks without locks.
pub struct QueryRouter {
    classifier: QueryClassifier,
    tables: Arc<ReferenceTables>,
    config: RouterConfig,
    telemetry: Arc<dyn TelemetrySink>,
}

impl QueryRouter {
    /// Builds a router over an explicit catalogue and roster snapshot.
    /// Config is re-validated here so a hand-built config cannot smuggle in
    /// an inconsistent threshold set.
    pub fn new(
        catalogue: IntentCatalogue,
        tables: ReferenceTables,
        config: RouterConfig,
    ) -> Result<Self, RouterError> {
        config.validate()?;
        Ok(Self {
            classifier: QueryClassifier::new(catalogue.into_shared()),
            tables: Arc::new(tables),
            config,
            telemetry: Arc::new(NoopTelemetry),
        })
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Classifies a free-text query and selects its execution path.
    ///
    /// Always returns a well-formed result pair, except in
    /// `deterministic_only` mode where low confidence surfaces as
    /// [`RouterError::InsufficientConfidence`]. Telemetry fires exactly once
    /// either way.
    pub fn classify_and_route(
        &self,
        query: &str,
        ctx: &QueryContext,
    ) -> Result<(ClassificationResult, RoutingDecision), RouterError> {
        let started = Instant::now();
        let entities = extract(query, &self.tables);
        let result = self.classifier.classify(query, &entities, ctx);

        match select_path(&result, &self.config) {
            Ok(decision) => {
                info!(
                    intent = %result.intent,
                    confidence = result.confidence,
                    path = decision.path.as_str(),
                    "routed query"
                );
                self.emit(query, &result, decision.path.as_str(), decision.delegate, started);
                Ok((result, decision))
            }
            Err(err) => {
                warn!(
                    intent = %result.intent,
                    confidence = result.confidence,
                    "query rejected in deterministic-only mode"
                );
                self.emit(query, &result, PATH_REJECTED, false, started);
                Err(err)
            }
        }
    }

    /// Routes a structured UI action that already names its intent,
    /// bypassing the scoring pipeline entirely. Direct actions resolve
    /// locally regardless of strategy mode.
    pub fn route_direct(&self, action: DirectAction) -> (ClassificationResult, RoutingDecision) {
        let started = Instant::now();
        let result = ClassificationResult {
            intent: action.intent_name().to_string(),
            confidence: CONFIDENCE_CEILING,
            matched_entities: BTreeMap::new(),
            patterns_matched: 0,
        };
        let decision = RoutingDecision {
            path: ExecutionPath::Deterministic,
            delegate: false,
            rationale: "structured action names its intent; classifier bypassed".to_string(),
        };
        info!(action = ?action, intent = %result.intent, "routed direct action");
        self.emit(action.intent_name(), &result, decision.path.as_str(), false, started);
        (result, decision)
    }

    /// Fire-and-forget event emission. Sinks swallow their own failures, so
    /// this can never fail or slow the classify path.
    fn emit(
        &self,
        query: &str,
        result: &ClassificationResult,
        path: &str,
        delegated: bool,
        started: Instant,
    ) {
        self.telemetry.record(ClassificationEvent {
            timestamp: Utc::now(),
            query_preview: preview(query),
            intent: result.intent.clone(),
            confidence: result.confidence,
            patterns_matched: result.patterns_matched,
            execution_path: path.to_string(),
            delegated,
            elapsed_micros: started.elapsed().as_micros() as u64,
        });
    }
}
