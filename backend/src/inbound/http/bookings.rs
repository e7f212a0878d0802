//! Booking endpoints for customers, providers, and admins.
//!
//! ```text
//! POST  /api/v1/bookings {"serviceId":"…","address":{"houseNumber":"12B","label":"Home"},"phone":"+919876543210"}
//! GET   /api/v1/bookings
//! GET   /api/v1/bookings/{id}
//! PATCH /api/v1/bookings/{id}/complete
//! GET   /api/v1/provider/bookings
//! POST  /api/v1/provider/bookings/{id}/accept
//! POST  /api/v1/provider/bookings/{id}/reject
//! GET   /api/v1/admin/bookings
//! POST  /api/v1/admin/bookings/{id}/override {"status":"CANCELLED"}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{BookingDetails, CreateBookingRequest};
use crate::domain::{Booking, BookingEvent, BookingStatus, ServiceAddress};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    BOOKING_ID, SERVICE_ID, parse_address, parse_booking_id, parse_phone, parse_service_id,
};

/// Booking lifecycle state on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatusBody {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl From<BookingStatus> for BookingStatusBody {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => Self::Pending,
            BookingStatus::Assigned => Self::Assigned,
            BookingStatus::InProgress => Self::InProgress,
            BookingStatus::Completed => Self::Completed,
            BookingStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<BookingStatusBody> for BookingStatus {
    fn from(status: BookingStatusBody) -> Self {
        match status {
            BookingStatusBody::Pending => Self::Pending,
            BookingStatusBody::Assigned => Self::Assigned,
            BookingStatusBody::InProgress => Self::InProgress,
            BookingStatusBody::Completed => Self::Completed,
            BookingStatusBody::Cancelled => Self::Cancelled,
        }
    }
}

/// Where the job takes place.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressBody {
    #[schema(example = "12B")]
    pub house_number: String,
    #[schema(example = "Near the water tank")]
    pub landmark: Option<String>,
    #[schema(example = "Home")]
    pub label: String,
}

impl From<&ServiceAddress> for AddressBody {
    fn from(address: &ServiceAddress) -> Self {
        Self {
            house_number: address.house_number().to_owned(),
            landmark: address.landmark().map(str::to_owned),
            label: address.label().to_owned(),
        }
    }
}

/// New booking request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    pub service_id: String,
    pub address: AddressBody,
    #[schema(example = "+91 98765 43210")]
    pub phone: String,
}

impl TryFrom<CreateBookingBody> for CreateBookingRequest {
    type Error = crate::domain::Error;

    fn try_from(body: CreateBookingBody) -> Result<Self, Self::Error> {
        let CreateBookingBody {
            service_id,
            address,
            phone,
        } = body;
        Ok(Self {
            service_id: parse_service_id(&service_id, SERVICE_ID)?,
            address: parse_address(&address.house_number, address.landmark.as_deref(), &address.label)?,
            phone: parse_phone(&phone)?,
        })
    }
}

/// Admin status override.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OverrideBody {
    pub status: BookingStatusBody,
}

/// A booking.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    /// Absent while the booking has no provider.
    pub provider_id: Option<Uuid>,
    pub status: BookingStatusBody,
    pub address: AddressBody,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: *booking.id().as_uuid(),
            customer_id: *booking.customer_id().as_uuid(),
            service_id: *booking.service_id().as_uuid(),
            provider_id: booking.provider_id().map(|id| *id.as_uuid()),
            status: booking.status().into(),
            address: booking.address().into(),
            phone: booking.phone().as_ref().to_owned(),
            created_at: booking.created_at(),
        }
    }
}

/// One entry of a booking's status history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingEventResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Absent for the creation event.
    pub from_status: Option<BookingStatusBody>,
    pub to_status: BookingStatusBody,
    /// CUSTOMER, PROVIDER, SYSTEM, or ADMIN.
    #[schema(example = "SYSTEM")]
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl From<&BookingEvent> for BookingEventResponse {
    fn from(event: &BookingEvent) -> Self {
        Self {
            id: event.id(),
            booking_id: *event.booking_id().as_uuid(),
            from_status: event.from_status().map(Into::into),
            to_status: event.to_status().into(),
            actor: event.actor().as_str().to_owned(),
            created_at: event.created_at(),
        }
    }
}

/// A booking with its full history, oldest event first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingDetailsResponse {
    pub booking: BookingResponse,
    pub events: Vec<BookingEventResponse>,
}

impl From<&BookingDetails> for BookingDetailsResponse {
    fn from(details: &BookingDetails) -> Self {
        Self {
            booking: BookingResponse::from(&details.booking),
            events: details.events.iter().map(BookingEventResponse::from).collect(),
        }
    }
}

/// A freshly opened booking and the customer's remaining balance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedBookingResponse {
    pub booking: BookingResponse,
    pub events: Vec<BookingEventResponse>,
    #[schema(example = 60)]
    pub credits: u64,
}

fn to_responses(bookings: &[Booking]) -> Vec<BookingResponse> {
    bookings.iter().map(BookingResponse::from).collect()
}

/// Book a service, paying its credit cost. Customer only.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = CreateBookingBody,
    responses(
        (status = 201, description = "Booking opened and assigned", body = CreatedBookingResponse),
        (status = 400, description = "Invalid request or insufficient credits", body = ErrorSchema),
        (status = 403, description = "Customer role required", body = ErrorSchema),
        (status = 404, description = "Service not found", body = ErrorSchema),
        (status = 409, description = "No provider available", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "createBooking"
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateBookingBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let request = CreateBookingRequest::try_from(payload.into_inner())?;
    let created = state.bookings.create_booking(&caller, request).await?;
    let details = BookingDetailsResponse::from(&created.details);
    Ok(HttpResponse::Created().json(CreatedBookingResponse {
        booking: details.booking,
        events: details.events,
        credits: created.balance.value(),
    }))
}

/// The caller's bookings, newest first. Customer only.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    responses(
        (status = 200, description = "Own bookings", body = [BookingResponse]),
        (status = 403, description = "Customer role required", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "listBookings"
)]
#[get("/bookings")]
pub async fn list_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let bookings = state.bookings_query.list_customer_bookings(&caller).await?;
    Ok(web::Json(to_responses(&bookings)))
}

/// A booking with its history. Owner, assignee, or admin.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking and events", body = BookingDetailsResponse),
        (status = 403, description = "Not a party to this booking", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingDetailsResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let booking_id = parse_booking_id(&path.into_inner(), BOOKING_ID)?;
    let details = state.bookings_query.get_booking(&caller, &booking_id).await?;
    Ok(web::Json(BookingDetailsResponse::from(&details)))
}

/// Mark an accepted job done. Owning customer only.
#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/complete",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking completed", body = BookingDetailsResponse),
        (status = 403, description = "Not the booking's customer", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema),
        (status = 409, description = "Booking cannot complete from its status", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "completeBooking"
)]
#[patch("/bookings/{id}/complete")]
pub async fn complete_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingDetailsResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let booking_id = parse_booking_id(&path.into_inner(), BOOKING_ID)?;
    let details = state.bookings.complete(&caller, &booking_id).await?;
    Ok(web::Json(BookingDetailsResponse::from(&details)))
}

/// Jobs waiting for the caller's decision. Provider only.
#[utoipa::path(
    get,
    path = "/api/v1/provider/bookings",
    responses(
        (status = 200, description = "Assigned bookings", body = [BookingResponse]),
        (status = 403, description = "Provider role required", body = ErrorSchema)
    ),
    tags = ["provider"],
    operation_id = "listAssignedBookings"
)]
#[get("/provider/bookings")]
pub async fn list_assigned_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let bookings = state.bookings_query.list_assigned_bookings(&caller).await?;
    Ok(web::Json(to_responses(&bookings)))
}

/// Take an assigned job. Assigned provider only.
#[utoipa::path(
    post,
    path = "/api/v1/provider/bookings/{id}/accept",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking in progress", body = BookingDetailsResponse),
        (status = 403, description = "Not the assigned provider", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema),
        (status = 409, description = "Booking is not awaiting acceptance", body = ErrorSchema)
    ),
    tags = ["provider"],
    operation_id = "acceptBooking"
)]
#[post("/provider/bookings/{id}/accept")]
pub async fn accept_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingDetailsResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let booking_id = parse_booking_id(&path.into_inner(), BOOKING_ID)?;
    let details = state.bookings.accept(&caller, &booking_id).await?;
    Ok(web::Json(BookingDetailsResponse::from(&details)))
}

/// Decline an assigned job, returning it to PENDING. Assigned provider only.
#[utoipa::path(
    post,
    path = "/api/v1/provider/bookings/{id}/reject",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking back to pending", body = BookingDetailsResponse),
        (status = 403, description = "Not the assigned provider", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema),
        (status = 409, description = "Booking is not awaiting acceptance", body = ErrorSchema)
    ),
    tags = ["provider"],
    operation_id = "rejectBooking"
)]
#[post("/provider/bookings/{id}/reject")]
pub async fn reject_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookingDetailsResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let booking_id = parse_booking_id(&path.into_inner(), BOOKING_ID)?;
    let details = state.bookings.reject(&caller, &booking_id).await?;
    Ok(web::Json(BookingDetailsResponse::from(&details)))
}

/// Every booking, newest first. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings",
    responses(
        (status = 200, description = "All bookings", body = [BookingResponse]),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listAllBookings"
)]
#[get("/admin/bookings")]
pub async fn list_all_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let bookings = state.bookings_query.list_all_bookings(&caller).await?;
    Ok(web::Json(to_responses(&bookings)))
}

/// Force a booking into any status. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/admin/bookings/{id}/override",
    params(("id" = String, Path, description = "Booking id")),
    request_body = OverrideBody,
    responses(
        (status = 200, description = "Status forced", body = BookingDetailsResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema),
        (status = 409, description = "Status unchanged or provider missing", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "overrideBookingStatus"
)]
#[post("/admin/bookings/{id}/override")]
pub async fn override_booking_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<OverrideBody>,
) -> ApiResult<web::Json<BookingDetailsResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let booking_id = parse_booking_id(&path.into_inner(), BOOKING_ID)?;
    let status = BookingStatus::from(payload.into_inner().status);
    let details = state
        .bookings
        .override_status(&caller, &booking_id, status)
        .await?;
    Ok(web::Json(BookingDetailsResponse::from(&details)))
}

#[cfg(test)]
#[path = "bookings/tests.rs"]
mod tests;
