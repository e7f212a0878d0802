//! Driven port for service listings.

use async_trait::async_trait;

use crate::domain::{Service, ServiceId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by service repository adapters.
    pub enum ServiceRepositoryError {
        Connection { message: String } => "service repository connection failed: {message}",
        Query { message: String } => "service repository query failed: {message}",
        /// The owning provider does not exist.
        UnknownProvider { provider_id: String } => "provider {provider_id} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn save(&self, service: &Service) -> Result<(), ServiceRepositoryError>;

    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, ServiceRepositoryError>;

    /// Every listing, newest first.
    async fn list_all(&self) -> Result<Vec<Service>, ServiceRepositoryError>;

    /// Listings owned by `provider_id`, newest first.
    async fn list_by_provider(&self, provider_id: &UserId) -> Result<Vec<Service>, ServiceRepositoryError>;
}

/// Fixture repository that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureServiceRepository;

#[async_trait]
impl ServiceRepository for FixtureServiceRepository {
    async fn save(&self, _service: &Service) -> Result<(), ServiceRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &ServiceId) -> Result<Option<Service>, ServiceRepositoryError> {
        Ok(None)
    }

    async fn list_all(&self) -> Result<Vec<Service>, ServiceRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_by_provider(&self, _provider_id: &UserId) -> Result<Vec<Service>, ServiceRepositoryError> {
        Ok(Vec::new())
    }
}
