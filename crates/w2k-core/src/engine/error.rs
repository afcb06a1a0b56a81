use thiserror::Error;

use w2k_model::JobHandle;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{kind} not found: {label}")]
    NotFound { kind: &'static str, label: String },

    #[error("unknown job: {0}")]
    UnknownJob(JobHandle),

    #[error("unsupported by engine '{engine}': {what}")]
    Unsupported { engine: &'static str, what: String },

    #[error("invalid submission: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("internal error: {0}")]
    Internal(String),
}
