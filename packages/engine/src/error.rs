//! Error types for the Minutario engine

use thiserror::Error;

/// Main error type for document generation operations
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Required input field absent where no safe default exists
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// Date string not in ISO YYYY-MM-DD form
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Transcriber received a negative number
    #[error("Cannot transcribe negative number: {0}")]
    NegativeNumber(i64),

    /// Transcriber received a string that is not a number
    #[error("Cannot transcribe '{0}' as a number")]
    UnparseableNumber(String),

    /// Number beyond the magnitudes legal documents use
    #[error("Number {0} exceeds the supported transcription magnitude")]
    NumberTooLarge(i64),

    /// Aclaratoria chain nested past the configured limit
    #[error("Clause nesting exceeds maximum depth of {max}")]
    ClauseDepthExceeded { max: usize },

    /// Too many parties in a single transaction
    #[error("Party list exceeds maximum of {max}")]
    TooManyParties { max: usize },

    /// Template file missing from the templates directory
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Underlying template engine failure; propagated with original message
    #[error("Render failed: {0}")]
    RenderFailed(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, GenerationError>;
