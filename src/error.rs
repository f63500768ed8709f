// src/error.rs
// Error taxonomy for the routing core

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the routing core.
///
/// "No intent matched" is not an error; it is a normal classification result
/// carrying the unclassified sentinel. Only the strict `deterministic_only`
/// rejection and startup-time configuration problems are reportable failures.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The query scored below the deterministic threshold while the router is
    /// running in `deterministic_only` mode. Distinct from NoMatch so that
    /// pattern coverage gaps can be measured separately from unrecognizable
    /// input.
    #[error(
        "insufficient confidence {confidence:.2} for deterministic-only routing (requires {required:.2})"
    )]
    InsufficientConfidence { confidence: f32, required: f32 },

    /// Malformed or inconsistent configuration. Fatal at startup, never a
    /// per-request condition.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
