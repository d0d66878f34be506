use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in lattix-kge.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Binary encoding error.
    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    /// Saved model file does not exist.
    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    /// Entity not in the model's index.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),
    /// Relation not in the model's index.
    #[error("Relation not found: {0}")]
    RelationNotFound(String),
    /// Operation needs a fitted model.
    #[error("Model is not fitted")]
    NotFitted,
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Error from table/triple handling.
    #[error(transparent)]
    Table(#[from] lattix_core::Error),
}

/// Result type alias for lattix-kge.
pub type Result<T> = std::result::Result<T, Error>;
