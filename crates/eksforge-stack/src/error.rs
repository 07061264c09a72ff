//! Stack builder error types

use eksforge_cloud::CloudError;
use eksforge_core::ConfigError;
use thiserror::Error;

/// Errors raised while describing the stack
///
/// Template rendering failures of the bootstrap script surface as
/// [`ConfigError::TemplateRenderError`].
#[derive(Error, Debug)]
pub enum StackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, StackError>;
