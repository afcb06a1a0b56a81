use thiserror::Error;

use w2k_core::EngineError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("staging failed: {0}")]
    Stage(String),

    #[error("code {expected} requested but submission carries {actual}")]
    CodeMismatch { expected: String, actual: String },

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("process exited with non-zero code: {0}")]
    NonZeroExit(i32),

    #[error("process terminated by signal")]
    Signaled,

    #[error("invalid retrieve pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ExecError> for EngineError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Io(e) => EngineError::Io(e),
            ExecError::Json(e) => EngineError::Malformed(e.to_string()),
            other => EngineError::Internal(other.to_string()),
        }
    }
}
