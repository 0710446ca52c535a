use thiserror::Error;

/// Errors raised while configuring a normalizer or normalizing records
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Misuse of the schema registry or an invalid configuration document
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A root record lacks its identifier field
    #[error("record {index}: id field \"{field}\" missing from {entity} record")]
    MissingIdentifier {
        entity: String,
        field: String,
        index: usize,
    },

    /// A root record's identifier is an object or array
    #[error("record {index}: id field \"{field}\" of {entity} record is not a scalar")]
    InvalidIdentifier {
        entity: String,
        field: String,
        index: usize,
    },

    /// An input value is not a JSON object
    #[error("record {index}: expected a JSON object")]
    NotAnObject { index: usize },
}

impl NormalizeError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        NormalizeError::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
