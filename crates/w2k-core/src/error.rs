use thiserror::Error;

use w2k_model::ModelError;

use crate::{calcjob::CalcJobError, engine::EngineError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no calculation plugin registered for entry point: {0}")]
    NoPlugin(String),

    #[error("duplicate entry point: plugin '{0}' is already registered")]
    DuplicateEntryPoint(String),

    #[error("calculation error: {0}")]
    CalcJob(#[from] CalcJobError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}
