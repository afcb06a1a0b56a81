use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcJobError {
    #[error("invalid inputs for '{plugin}': {reason}")]
    InvalidInputs { plugin: &'static str, reason: String },

    #[error("missing input: {0}")]
    MissingInput(&'static str),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CalcJobError {
    fn from(e: std::io::Error) -> Self {
        CalcJobError::Io(e.to_string())
    }
}
