//! Error taxonomy for contentgate.
//!
//! Only configuration problems are fatal. Malformed content, evaluator
//! crashes and timeouts are absorbed into scores and never surface here.

/// Errors produced while loading or validating an [`EvaluationPolicy`](crate::policy::EvaluationPolicy).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid policy value `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("policy parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("policy io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{hook} is a configuration hook only and cannot be enabled")]
    UnsupportedHook { hook: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for policy operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Failure of a single evaluator invocation. Isolated by the coordinator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaluatorError {
    #[error("evaluator {agent} failed: {reason}")]
    Failed { agent: String, reason: String },
}

/// Errors produced by the verdict state machine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerdictError {
    #[error("illegal verdict transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },
}

/// Result type for verdict state-machine operations.
pub type VerdictResult<T> = std::result::Result<T, VerdictError>;

/// Errors surfaced to callers of the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("verdict error: {0}")]
    Verdict(#[from] VerdictError),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
