//! Rating endpoints.
//!
//! ```text
//! POST /api/v1/ratings {"bookingId":"…","rating":5,"review":"Spotless"}
//! GET  /api/v1/ratings/booking/{id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Rating;
use crate::domain::ports::AddRatingRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{BOOKING_ID, parse_booking_id};

/// Rating submission for a completed booking.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddRatingBody {
    pub booking_id: String,
    /// Whole stars, 1 to 5.
    #[schema(example = 5)]
    pub rating: i64,
    #[schema(example = "Spotless work")]
    pub review: Option<String>,
}

/// A stored rating.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: u8,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Rating> for RatingResponse {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id(),
            booking_id: *rating.booking_id().as_uuid(),
            customer_id: *rating.customer_id().as_uuid(),
            provider_id: *rating.provider_id().as_uuid(),
            rating: rating.rating().value(),
            review: rating.review().map(str::to_owned),
            created_at: rating.created_at(),
        }
    }
}

/// The stored rating with the provider's refreshed average.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingReceiptResponse {
    pub rating: RatingResponse,
    #[schema(example = 4.5)]
    pub rating_avg: f64,
}

/// Rate a completed booking. Owning customer only, once per booking.
#[utoipa::path(
    post,
    path = "/api/v1/ratings",
    request_body = AddRatingBody,
    responses(
        (status = 201, description = "Rating stored", body = RatingReceiptResponse),
        (status = 400, description = "Rating outside 1..=5 or bad id", body = ErrorSchema),
        (status = 403, description = "Not the booking's customer", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema),
        (status = 409, description = "Booking not completed or already rated", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "addRating"
)]
#[post("/ratings")]
pub async fn add_rating(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AddRatingBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let AddRatingBody {
        booking_id,
        rating,
        review,
    } = payload.into_inner();
    let request = AddRatingRequest {
        booking_id: parse_booking_id(&booking_id, BOOKING_ID)?,
        rating,
        review,
    };
    let receipt = state.ratings.add_rating(&caller, request).await?;
    Ok(HttpResponse::Created().json(RatingReceiptResponse {
        rating: RatingResponse::from(&receipt.rating),
        rating_avg: receipt.rating_avg.value(),
    }))
}

/// The rating left on one of the caller's bookings.
#[utoipa::path(
    get,
    path = "/api/v1/ratings/booking/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Rating", body = RatingResponse),
        (status = 403, description = "Rating belongs to another customer", body = ErrorSchema),
        (status = 404, description = "No rating yet", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "ratingForBooking"
)]
#[get("/ratings/booking/{id}")]
pub async fn rating_for_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RatingResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let booking_id = parse_booking_id(&path.into_inner(), BOOKING_ID)?;
    let rating = state.ratings_query.rating_for_booking(&caller, &booking_id).await?;
    Ok(web::Json(RatingResponse::from(&rating)))
}
