//! Driven port listing providers for pool-wide assignment.

use async_trait::async_trait;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by provider directory adapters.
    pub enum ProviderDirectoryError {
        Connection { message: String } => "provider directory connection failed: {message}",
        Query { message: String } => "provider directory query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    /// The earliest-registered account with the PROVIDER role, if any.
    async fn first_available_provider(&self) -> Result<Option<UserId>, ProviderDirectoryError>;
}

/// Directory with no providers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProviderDirectory;

#[async_trait]
impl ProviderDirectory for FixtureProviderDirectory {
    async fn first_available_provider(&self) -> Result<Option<UserId>, ProviderDirectoryError> {
        Ok(None)
    }
}
