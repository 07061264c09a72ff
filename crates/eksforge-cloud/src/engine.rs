//! Provisioning engine trait definition

use crate::error::Result;
use crate::resource::{Attributes, ResolvedResource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provisioning engine abstraction trait
///
/// The stack describes resources; an engine turns each resolved description
/// into a real (or simulated) resource and reports its attributes back so
/// dependent values can resolve.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the engine name (e.g., "local")
    fn name(&self) -> &str;

    /// Returns the engine display name for UI
    fn display_name(&self) -> &str;

    /// Check if the engine is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Perform a provider lookup and return its result attributes
    async fn read(&self, resource: &ResolvedResource) -> Result<Attributes>;

    /// Create a resource and return its attributes (inputs included)
    async fn create(&self, resource: &ResolvedResource) -> Result<Attributes>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}
