use thiserror::Error;

use crate::services::inference::InferenceError;

#[derive(Debug, Error)]
pub(crate) enum GradingError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("inference unavailable: {0}")]
    Transient(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GradingError {
    pub(crate) fn not_found(what: &str, id: &str) -> Self {
        Self::NotFound(format!("{what} {id}"))
    }

    /// Metric label for the failure class.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Transient(_) => "transient",
            Self::Store(_) => "store",
        }
    }
}

impl From<InferenceError> for GradingError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Transient(message) => Self::Transient(message),
            InferenceError::Validation(message) => Self::Validation(message),
        }
    }
}
