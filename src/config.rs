//! Engine settings.
//!
//! A [`RuleTable`](crate::RuleTable) carries the config it was built with;
//! an [`Executor`](crate::Executor) starts from that and may override it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default limit on nested rule invocations per execution.
pub const DEFAULT_MAX_DEPTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest nesting of rule invocations before execution aborts with a
    /// `RecursionLimit` failure.
    pub max_depth: usize,
    /// Run every rule body through the optimizer when the table is built.
    pub optimize: bool,
    /// Emit `trace` events on entry to and exit from every rule.
    pub trace_rules: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            optimize: false,
            trace_rules: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

impl EngineConfig {
    /// Reads a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        if config.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(config)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_trace_rules(mut self, trace_rules: bool) -> Self {
        self.trace_rules = trace_rules;
        self
    }
}
