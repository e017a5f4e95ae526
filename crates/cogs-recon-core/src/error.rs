use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("Invalid numeric value for {field}: {value:?} is not a decimal number")]
    InvalidNumericValue { field: String, value: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ReconError {
    fn from(e: serde_json::Error) -> Self {
        ReconError::SerializationError(e.to_string())
    }
}
