//! Error types for caldrop.

use thiserror::Error;

/// Errors that can occur while expanding rules or building calendar documents.
#[derive(Error, Debug)]
pub enum CalDropError {
    /// A required field is missing or a value is out of range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A rule names a frequency or end type we don't know how to expand.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),
}

impl CalDropError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        CalDropError::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        CalDropError::Configuration(msg.into())
    }
}

/// Result type alias for caldrop operations.
pub type CalDropResult<T> = Result<T, CalDropError>;
