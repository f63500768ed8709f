// src/config/mod.rs
// Routing configuration loaded once at startup from the environment

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy governing how confidence maps to an execution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    /// Resolve locally when confident, otherwise fall through to the model.
    DeterministicFirst,
    /// Route every query to the model regardless of confidence.
    LlmOnly,
    /// Resolve locally or fail. Used to validate pattern coverage.
    DeterministicOnly,
    /// Like deterministic_first, but mid/low bands may delegate to the
    /// multi-agent orchestrator when delegation is enabled.
    Hybrid,
}

impl StrategyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMode::DeterministicFirst => "deterministic_first",
            StrategyMode::LlmOnly => "llm_only",
            StrategyMode::DeterministicOnly => "deterministic_only",
            StrategyMode::Hybrid => "hybrid",
        }
    }
}

impl FromStr for StrategyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deterministic_first" => Ok(StrategyMode::DeterministicFirst),
            "llm_only" => Ok(StrategyMode::LlmOnly),
            "deterministic_only" => Ok(StrategyMode::DeterministicOnly),
            "hybrid" => Ok(StrategyMode::Hybrid),
            other => Err(format!("unknown strategy mode '{other}'")),
        }
    }
}

/// Configuration problems detected at startup. Always fatal; the router never
/// starts with a half-valid threshold set.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be within 0.0..=1.0 (got {value})")]
    OutOfRange { key: &'static str, value: f32 },

    #[error(
        "llm-assist threshold {llm_assist} must not exceed deterministic threshold {deterministic}"
    )]
    ThresholdOrder { llm_assist: f32, deterministic: f32 },
}

/// Strategy mode and threshold set for the routing core.
///
/// Loaded once from the environment at process start; changing values
/// requires a restart. All thresholds are validated up front so a bad
/// combination fails initialization instead of misbehaving per-request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub strategy_mode: StrategyMode,
    /// Confidence floor for the deterministic path (inclusive).
    pub deterministic_threshold: f32,
    /// Confidence floor for the llm-assisted band (inclusive).
    pub llm_assist_threshold: f32,
    /// Floor gating delegation to the external orchestrator. Only consulted
    /// in hybrid mode with delegation enabled.
    pub delegation_threshold: f32,
    pub delegation_enabled: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strategy_mode: StrategyMode::DeterministicFirst,
            deterministic_threshold: 0.8,
            llm_assist_threshold: 0.6,
            delegation_threshold: 0.5,
            delegation_enabled: false,
        }
    }
}

/// Reads an environment variable, tolerating trailing comments and
/// whitespace. Missing variables fall back to the default; present but
/// unparseable values are a hard error.
fn env_parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => {
            let clean = raw.split('#').next().unwrap_or("").trim();
            clean.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: "could not parse".to_string(),
            })
        }
        Err(_) => Ok(default),
    }
}

impl RouterConfig {
    /// Loads configuration from the environment (and `.env` if present),
    /// failing fast on malformed or inconsistent values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let defaults = RouterConfig::default();
        let config = Self {
            strategy_mode: env_parsed("COMPASS_STRATEGY_MODE", defaults.strategy_mode)?,
            deterministic_threshold: env_parsed(
                "COMPASS_DETERMINISTIC_THRESHOLD",
                defaults.deterministic_threshold,
            )?,
            llm_assist_threshold: env_parsed(
                "COMPASS_LLM_ASSIST_THRESHOLD",
                defaults.llm_assist_threshold,
            )?,
            delegation_threshold: env_parsed(
                "COMPASS_DELEGATION_THRESHOLD",
                defaults.delegation_threshold,
            )?,
            delegation_enabled: env_parsed(
                "COMPASS_DELEGATION_ENABLED",
                defaults.delegation_enabled,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range-checks every threshold and enforces band ordering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("deterministic_threshold", self.deterministic_threshold),
            ("llm_assist_threshold", self.llm_assist_threshold),
            ("delegation_threshold", self.delegation_threshold),
        ];
        for (key, value) in ranges {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { key, value });
            }
        }
        if self.llm_assist_threshold > self.deterministic_threshold {
            return Err(ConfigError::ThresholdOrder {
                llm_assist: self.llm_assist_threshold,
                deterministic: self.deterministic_threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RouterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy_mode, StrategyMode::DeterministicFirst);
        assert_eq!(config.deterministic_threshold, 0.8);
        assert_eq!(config.llm_assist_threshold, 0.6);
    }

    #[test]
    fn test_strategy_mode_parsing() {
        assert_eq!(
            "deterministic_first".parse::<StrategyMode>().unwrap(),
            StrategyMode::DeterministicFirst
        );
        assert_eq!("llm_only".parse::<StrategyMode>().unwrap(), StrategyMode::LlmOnly);
        assert_eq!(
            "Deterministic_Only".parse::<StrategyMode>().unwrap(),
            StrategyMode::DeterministicOnly
        );
        assert_eq!("hybrid".parse::<StrategyMode>().unwrap(), StrategyMode::Hybrid);
        assert!("chaotic".parse::<StrategyMode>().is_err());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config = RouterConfig {
            deterministic_threshold: 1.3,
            ..RouterConfig::default()
        };
        match config.validate() {
            Err(ConfigError::OutOfRange { key, .. }) => {
                assert_eq!(key, "deterministic_threshold")
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_band_order_rejected() {
        let config = RouterConfig {
            deterministic_threshold: 0.5,
            llm_assist_threshold: 0.7,
            ..RouterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn test_equal_thresholds_allowed() {
        // A zero-width llm-assist band is legal; the mid band just vanishes.
        let config = RouterConfig {
            deterministic_threshold: 0.7,
            llm_assist_threshold: 0.7,
            ..RouterConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
