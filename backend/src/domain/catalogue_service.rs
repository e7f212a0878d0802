//! Service catalogue domain service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::booking_service::map_service_repository_error;
use crate::domain::ports::{CatalogueCommand, CatalogueQuery, CreateServiceRequest, ServiceRepository};
use crate::domain::{
    Caller, Error, RatingAverage, Role, Service, ServiceDraft, ServiceId, ServiceValidationError,
};

fn map_validation_error(error: ServiceValidationError) -> Error {
    let field = match error {
        ServiceValidationError::EmptyTitle => "title",
        ServiceValidationError::EmptyCategory => "category",
        ServiceValidationError::InvalidCreditCost => "creditCost",
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field, "code": "invalid_service" }))
}

/// Catalogue service implementing [`CatalogueCommand`] and [`CatalogueQuery`].
#[derive(Clone)]
pub struct CatalogueService<S> {
    services: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> CatalogueService<S> {
    pub fn new(services: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { services, clock }
    }
}

#[async_trait]
impl<S> CatalogueCommand for CatalogueService<S>
where
    S: ServiceRepository,
{
    async fn create_service(&self, caller: &Caller, request: CreateServiceRequest) -> Result<Service, Error> {
        let provider_id = match caller.role() {
            Role::Provider => Some(*caller.id()),
            Role::Admin => None,
            Role::Customer => {
                return Err(Error::forbidden("only providers and admins can create services"));
            }
        };
        let service = Service::new(ServiceDraft {
            id: ServiceId::random(),
            provider_id,
            title: request.title,
            category: request.category,
            description: request.description,
            credit_cost: request.credit_cost,
            rating_avg: RatingAverage::default(),
            created_at: self.clock.utc(),
        })
        .map_err(map_validation_error)?;

        self.services
            .save(&service)
            .await
            .map_err(map_service_repository_error)?;
        info!(
            service_id = %service.id(),
            user_id = %caller.id(),
            owned = provider_id.is_some(),
            "service created"
        );
        Ok(service)
    }
}

#[async_trait]
impl<S> CatalogueQuery for CatalogueService<S>
where
    S: ServiceRepository,
{
    async fn list_services(&self) -> Result<Vec<Service>, Error> {
        self.services
            .list_all()
            .await
            .map_err(map_service_repository_error)
    }

    async fn list_provider_services(&self, caller: &Caller) -> Result<Vec<Service>, Error> {
        caller.require(Role::Provider)?;
        self.services
            .list_by_provider(caller.id())
            .await
            .map_err(map_service_repository_error)
    }
}
