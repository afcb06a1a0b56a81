use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid target volume: {0}")]
    InvalidVolume(f64),

    #[error("degenerate cell: volume is {0}")]
    DegenerateCell(f64),

    #[error("invalid resources: {0}")]
    InvalidResources(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
