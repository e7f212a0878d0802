//! Driving ports for service listings.

use async_trait::async_trait;

use crate::domain::{Caller, Error, Service};

/// Listing fields supplied by a provider or admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServiceRequest {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub credit_cost: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueCommand: Send + Sync {
    /// Providers create listings they own; admins create unowned listings.
    async fn create_service(&self, caller: &Caller, request: CreateServiceRequest) -> Result<Service, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    /// All listings, newest first.
    async fn list_services(&self) -> Result<Vec<Service>, Error>;

    /// The calling provider's listings.
    async fn list_provider_services(&self, caller: &Caller) -> Result<Vec<Service>, Error>;
}
