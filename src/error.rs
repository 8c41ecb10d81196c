use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarouselError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Shape mismatch: expected input of length {expected}, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
    },
    #[error("Length mismatch: sequence has {expected} inputs but {actual} targets were given")]
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    #[error("Cannot compute gradients for an empty sequence")]
    EmptySequence,
}

impl CarouselError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CarouselError::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CarouselError>;
