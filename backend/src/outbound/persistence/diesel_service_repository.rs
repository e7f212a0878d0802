//! PostgreSQL-backed [`ServiceRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ServiceRepository, ServiceRepositoryError};
use crate::domain::{Service, ServiceId, UserId};

use super::diesel_error_mapping::{is_foreign_key_violation, map_diesel_error, map_pool_error};
use super::models::{NewServiceRow, ServiceRow};
use super::pool::DbPool;
use super::schema::services;

/// Diesel adapter over the `services` table.
#[derive(Clone)]
pub struct DieselServiceRepository {
    pool: DbPool,
}

impl DieselServiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn service_error(error: diesel::result::Error) -> ServiceRepositoryError {
    map_diesel_error(error, ServiceRepositoryError::query, ServiceRepositoryError::connection)
}

fn rows_to_services(rows: Vec<ServiceRow>) -> Result<Vec<Service>, ServiceRepositoryError> {
    rows.into_iter()
        .map(|row| Service::try_from(row).map_err(|err| ServiceRepositoryError::query(err.to_string())))
        .collect()
}

#[async_trait]
impl ServiceRepository for DieselServiceRepository {
    async fn save(&self, service: &Service) -> Result<(), ServiceRepositoryError> {
        let credit_cost = service
            .credit_cost()
            .to_stored()
            .map_err(|err| ServiceRepositoryError::query(err.to_string()))?;
        let row = NewServiceRow {
            id: *service.id().as_uuid(),
            provider_id: service.provider_id().map(|id| *id.as_uuid()),
            title: service.title(),
            category: service.category(),
            description: service.description(),
            credit_cost,
            rating_avg: service.rating_avg().value(),
            created_at: service.created_at(),
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ServiceRepositoryError::connection))?;
        diesel::insert_into(services::table)
            .values(&row)
            .on_conflict(services::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    let owner = service.provider_id().map(ToString::to_string).unwrap_or_default();
                    ServiceRepositoryError::unknown_provider(owner)
                } else {
                    service_error(err)
                }
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, ServiceRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ServiceRepositoryError::connection))?;
        let row = services::table
            .find(*id.as_uuid())
            .select(ServiceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(service_error)?;
        row.map(|row| Service::try_from(row).map_err(|err| ServiceRepositoryError::query(err.to_string())))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Service>, ServiceRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ServiceRepositoryError::connection))?;
        let rows = services::table
            .order((services::created_at.desc(), services::id.desc()))
            .select(ServiceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(service_error)?;
        rows_to_services(rows)
    }

    async fn list_by_provider(&self, provider_id: &UserId) -> Result<Vec<Service>, ServiceRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ServiceRepositoryError::connection))?;
        let rows = services::table
            .filter(services::provider_id.eq(*provider_id.as_uuid()))
            .order((services::created_at.desc(), services::id.desc()))
            .select(ServiceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(service_error)?;
        rows_to_services(rows)
    }
}
