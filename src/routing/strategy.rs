// src/routing/strategy.rs
// Maps (classification result, configuration) onto an execution path

use tracing::debug;

use crate::config::{RouterConfig, StrategyMode};
use crate::error::RouterError;

use super::types::{ClassificationResult, ExecutionPath, RoutingDecision};

/// Selects the execution path for a classified query.
///
/// Thresholds are inclusive: a confidence exactly equal to the deterministic
/// threshold takes the deterministic path. The only failing combination is
/// `deterministic_only` below its threshold, which is an explicit
/// [`RouterError::InsufficientConfidence`] rather than a silent fallback.
pub fn select_path(
    result: &ClassificationResult,
    config: &RouterConfig,
) -> Result<RoutingDecision, RouterError> {
    let c = result.confidence;
    let det = config.deterministic_threshold;
    let assist = config.llm_assist_threshold;

    let decision = match config.strategy_mode {
        StrategyMode::LlmOnly => RoutingDecision {
            path: ExecutionPath::FullModel,
            delegate: false,
            rationale: "llm_only mode routes every query to the model".to_string(),
        },
        StrategyMode::DeterministicOnly => {
            if c >= det {
                RoutingDecision {
                    path: ExecutionPath::Deterministic,
                    delegate: false,
                    rationale: format!(
                        "confidence {c:.2} >= deterministic threshold {det:.2}"
                    ),
                }
            } else {
                return Err(RouterError::InsufficientConfidence {
                    confidence: c,
                    required: det,
                });
            }
        }
        StrategyMode::DeterministicFirst => {
            if c >= det {
                RoutingDecision {
                    path: ExecutionPath::Deterministic,
                    delegate: false,
                    rationale: format!(
                        "confidence {c:.2} >= deterministic threshold {det:.2}"
                    ),
                }
            } else if c >= assist {
                RoutingDecision {
                    path: ExecutionPath::LlmAssisted,
                    delegate: false,
                    rationale: format!(
                        "confidence {c:.2} within llm-assist band [{assist:.2}, {det:.2})"
                    ),
                }
            } else {
                RoutingDecision {
                    path: ExecutionPath::FullModel,
                    delegate: false,
                    rationale: format!(
                        "confidence {c:.2} below llm-assist threshold {assist:.2}"
                    ),
                }
            }
        }
        StrategyMode::Hybrid => {
            if c >= det {
                RoutingDecision {
                    path: ExecutionPath::Deterministic,
                    delegate: false,
                    rationale: format!(
                        "confidence {c:.2} >= deterministic threshold {det:.2}"
                    ),
                }
            } else if c >= assist {
                let delegate = config.delegation_enabled && c < config.delegation_threshold;
                RoutingDecision {
                    path: ExecutionPath::LlmAssisted,
                    delegate,
                    rationale: if delegate {
                        format!(
                            "confidence {c:.2} within llm-assist band, below delegation threshold {:.2}; delegating",
                            config.delegation_threshold
                        )
                    } else {
                        format!(
                            "confidence {c:.2} within llm-assist band [{assist:.2}, {det:.2})"
                        )
                    },
                }
            } else {
                let delegate = config.delegation_enabled;
                RoutingDecision {
                    path: ExecutionPath::FullModel,
                    delegate,
                    rationale: if delegate {
                        format!(
                            "confidence {c:.2} below llm-assist threshold {assist:.2}; delegating"
                        )
                    } else {
                        format!(
                            "confidence {c:.2} below llm-assist threshold {assist:.2}"
                        )
                    },
                }
            }
        }
    };

    debug!(
        mode = config.strategy_mode.as_str(),
        confidence = c,
        path = decision.path.as_str(),
        delegate = decision.delegate,
        "selected execution path"
    );
    Ok(decision)
}
