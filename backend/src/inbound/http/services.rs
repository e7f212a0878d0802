//! Service catalogue endpoints.
//!
//! ```text
//! GET /api/v1/services
//! POST /api/v1/services {"title":"Deep cleaning","category":"Cleaning","creditCost":40}
//! GET /api/v1/provider/services
//! POST /api/v1/provider/services {"title":"AC repair","category":"Repair","creditCost":60}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::CreateServiceRequest;
use crate::domain::{Caller, Role, Service};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// New listing.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceBody {
    #[schema(example = "Deep cleaning")]
    pub title: String,
    #[schema(example = "Cleaning")]
    pub category: String,
    pub description: Option<String>,
    /// Credits charged per booking; must be positive.
    #[schema(example = 40)]
    pub credit_cost: i64,
}

impl From<CreateServiceBody> for CreateServiceRequest {
    fn from(body: CreateServiceBody) -> Self {
        Self {
            title: body.title,
            category: body.category,
            description: body.description,
            credit_cost: body.credit_cost,
        }
    }
}

/// Catalogue listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: Uuid,
    /// Owning provider; absent for admin-created listings.
    pub provider_id: Option<Uuid>,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub credit_cost: u64,
    /// Mean rating of the owning provider, two decimals; 0 when unrated.
    #[schema(example = 4.33)]
    pub rating_avg: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Service> for ServiceResponse {
    fn from(service: &Service) -> Self {
        Self {
            id: *service.id().as_uuid(),
            provider_id: service.provider_id().map(|id| *id.as_uuid()),
            title: service.title().to_owned(),
            category: service.category().to_owned(),
            description: service.description().map(str::to_owned),
            credit_cost: service.credit_cost().value(),
            rating_avg: service.rating_avg().value(),
            created_at: service.created_at(),
        }
    }
}

fn to_responses(services: &[Service]) -> Vec<ServiceResponse> {
    services.iter().map(ServiceResponse::from).collect()
}

async fn create_as(
    state: &HttpState,
    caller: &Caller,
    role: Role,
    body: CreateServiceBody,
) -> ApiResult<HttpResponse> {
    caller.require(role)?;
    let service = state.catalogue.create_service(caller, body.into()).await?;
    Ok(HttpResponse::Created().json(ServiceResponse::from(&service)))
}

/// Every listing, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/services",
    responses(
        (status = 200, description = "Listings", body = [ServiceResponse]),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["services"],
    operation_id = "listServices"
)]
#[get("/services")]
pub async fn list_services(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ServiceResponse>>> {
    session.require_caller(state.profile.as_ref()).await?;
    let services = state.catalogue_query.list_services().await?;
    Ok(web::Json(to_responses(&services)))
}

/// Create an unowned listing. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/services",
    request_body = CreateServiceBody,
    responses(
        (status = 201, description = "Created", body = ServiceResponse),
        (status = 400, description = "Invalid listing", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["services"],
    operation_id = "createService"
)]
#[post("/services")]
pub async fn create_service(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateServiceBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    create_as(&state, &caller, Role::Admin, payload.into_inner()).await
}

/// The caller's own listings. Provider only.
#[utoipa::path(
    get,
    path = "/api/v1/provider/services",
    responses(
        (status = 200, description = "Own listings", body = [ServiceResponse]),
        (status = 403, description = "Provider role required", body = ErrorSchema)
    ),
    tags = ["services"],
    operation_id = "listProviderServices"
)]
#[get("/provider/services")]
pub async fn list_provider_services(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ServiceResponse>>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let services = state.catalogue_query.list_provider_services(&caller).await?;
    Ok(web::Json(to_responses(&services)))
}

/// Create a listing owned by the caller. Provider only.
#[utoipa::path(
    post,
    path = "/api/v1/provider/services",
    request_body = CreateServiceBody,
    responses(
        (status = 201, description = "Created", body = ServiceResponse),
        (status = 400, description = "Invalid listing", body = ErrorSchema),
        (status = 403, description = "Provider role required", body = ErrorSchema)
    ),
    tags = ["services"],
    operation_id = "createProviderService"
)]
#[post("/provider/services")]
pub async fn create_provider_service(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateServiceBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    create_as(&state, &caller, Role::Provider, payload.into_inner()).await
}
