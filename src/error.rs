//! Error types for bidder feature extraction.
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Summarizers
//! fail only on contract violations (empty input); the pipeline surfaces
//! malformed entities with the offending entity and column named.

use thiserror::Error;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Main error type for the extraction engine and its collaborators.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A required column is absent or unusable for an entity's events.
    #[error("Malformed input for entity '{entity}', column '{column}': {reason}")]
    MalformedInput {
        entity: String,
        column: String,
        reason: String,
    },

    /// A summarizer received an empty sequence.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Data handed to a fitted transform (or a cached artifact) does not
    /// match the schema it was fitted on.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact '{name}': {reason}")]
    Artifact { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Generic(String),
}

impl ExtractError {
    /// Build a generic error from any message.
    pub fn generic(msg: impl Into<String>) -> Self {
        ExtractError::Generic(msg.into())
    }

    /// Build a malformed-input error for one entity and column.
    pub fn malformed(
        entity: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ExtractError::MalformedInput {
            entity: entity.into(),
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Build an artifact-store error.
    pub fn artifact(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractError::Artifact {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error identifies a malformed entity (as opposed to an
    /// infrastructure failure).
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ExtractError::MalformedInput { .. })
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExtractError {
    fn from(err: toml::de::Error) -> Self {
        ExtractError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ExtractError {
    fn from(err: toml::ser::Error) -> Self {
        ExtractError::Serialization(err.to_string())
    }
}

impl From<ndarray_npy::WriteNpyError> for ExtractError {
    fn from(err: ndarray_npy::WriteNpyError) -> Self {
        ExtractError::Serialization(format!("npy write failed: {err}"))
    }
}
