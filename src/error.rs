//! Error types for the DynamoDB helpers.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the helper operations.
///
/// Validation variants are raised before any request is sent. `Store`
/// carries the SDK's own error untouched.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Item is missing key attribute '{field}'")]
    MissingKey { field: String },

    #[error("No operator given for field '{field}'")]
    MissingOperator { field: String },

    #[error("Value for field '{field}' must be a string or a number")]
    UnsupportedValue { field: String },

    #[error("Unknown comparison operator '{0}'")]
    InvalidOperator(String),

    #[error("Failed to convert value: {0}")]
    Marshal(#[from] serde_dynamo::Error),

    #[error("Failed to build request: {0}")]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),

    #[error("Authentication failed")]
    Authentication,

    #[error("DynamoDB request failed: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an error raised at the store boundary.
    pub fn store(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Store(err.into())
    }

    /// Returns true for errors raised locally, before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::NoFieldsToUpdate
                | Error::MissingKey { .. }
                | Error::MissingOperator { .. }
                | Error::UnsupportedValue { .. }
                | Error::InvalidOperator(_)
        )
    }
}
