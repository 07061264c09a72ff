//! Local engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalError {
    #[error("Injected failure for {0}")]
    InjectedFailure(String),

    #[error("Input '{input}' is required")]
    MissingInput { input: &'static str },

    #[error("Unsupported lookup type: {0}")]
    UnsupportedLookup(String),

    #[error("Invalid account id '{0}': expected 12 digits")]
    InvalidAccountId(String),
}

pub type Result<T> = std::result::Result<T, LocalError>;
