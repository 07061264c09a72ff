//! Resource graph and engine error types

use thiserror::Error;

/// Errors raised while describing, planning, or applying a stack
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource already registered: {0}")]
    DuplicateResource(String),

    #[error("Resource '{resource}' depends on '{dependency}', which is not registered before it")]
    UnknownDependency {
        resource: String,
        dependency: String,
    },

    #[error("Output already exported: {0}")]
    DuplicateExport(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Attribute '{path}' not found on resource '{resource}'")]
    AttributeNotFound { resource: String, path: String },

    #[error("Unexpected value {value}: expected {expected}")]
    TypeMismatch { value: String, expected: &'static str },

    #[error("Value never resolved: {0}")]
    UnresolvedValue(String),

    #[error("Creating {resource} failed: {message}")]
    CreationFailed { resource: String, message: String },

    #[error("Reading {resource} failed: {message}")]
    ReadFailed { resource: String, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
