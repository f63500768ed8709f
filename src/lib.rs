// src/lib.rs

pub mod config;
pub mod error;
pub mod feedback;
pub mod routing;
pub mod telemetry;

pub use config::{RouterConfig, StrategyMode};
pub use error::RouterError;
pub use routing::router::QueryRouter;
