//! Rating aggregator service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::booking_service::map_booking_repository_error;
use crate::domain::ports::{
    AddRatingRequest, BookingRepository, RatingCommand, RatingQuery, RatingReceipt,
    RatingRepository, RatingRepositoryError,
};
use crate::domain::{
    BookingId, BookingStatus, Caller, Error, FailureReason, Rating, RatingDraft, RatingValue,
    Role,
};

fn map_rating_repository_error(error: RatingRepositoryError) -> Error {
    match error {
        RatingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("rating repository unavailable: {message}"))
        }
        RatingRepositoryError::Query { message } => {
            Error::internal(format!("rating repository error: {message}"))
        }
        RatingRepositoryError::AlreadyRated { booking_id } => {
            Error::conflict(format!("booking {booking_id} is already rated"))
                .with_reason(FailureReason::AlreadyRated)
        }
        RatingRepositoryError::NotCompleted { booking_id } => {
            Error::conflict(format!("booking {booking_id} is no longer completed"))
                .with_reason(FailureReason::InvalidState)
        }
    }
}

/// Records ratings and keeps `Service.ratingAvg` current.
#[derive(Clone)]
pub struct RatingService<B, R> {
    bookings: Arc<B>,
    ratings: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<B, R> RatingService<B, R> {
    pub fn new(bookings: Arc<B>, ratings: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings,
            ratings,
            clock,
        }
    }
}

#[async_trait]
impl<B, R> RatingCommand for RatingService<B, R>
where
    B: BookingRepository,
    R: RatingRepository,
{
    async fn add_rating(&self, caller: &Caller, request: AddRatingRequest) -> Result<RatingReceipt, Error> {
        caller.require(Role::Customer)?;
        let value = RatingValue::new(request.rating).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "rating", "value": err.value }))
                .with_reason(FailureReason::InvalidRating)
        })?;

        let booking = self
            .bookings
            .find_by_id(&request.booking_id)
            .await
            .map_err(map_booking_repository_error)?
            .ok_or_else(|| Error::not_found(format!("booking {} not found", request.booking_id)))?;
        if booking.customer_id() != caller.id() {
            return Err(Error::forbidden("only the booking's customer can rate it"));
        }
        if booking.status() != BookingStatus::Completed {
            return Err(Error::conflict("only completed bookings can be rated")
                .with_details(json!({ "status": booking.status() }))
                .with_reason(FailureReason::InvalidState));
        }
        let provider_id = *booking.provider_id().ok_or_else(|| {
            Error::internal(format!("completed booking {} has no provider", booking.id()))
        })?;

        let rating = Rating::new(RatingDraft {
            id: Uuid::new_v4(),
            booking_id: *booking.id(),
            customer_id: *caller.id(),
            provider_id,
            rating: value,
            review: request.review,
            created_at: self.clock.utc(),
        });
        let rating_avg = self
            .ratings
            .record(&rating, booking.service_id())
            .await
            .map_err(map_rating_repository_error)?;

        info!(
            booking_id = %booking.id(),
            provider_id = %provider_id,
            service_id = %booking.service_id(),
            rating = value.value(),
            rating_avg = rating_avg.value(),
            "rating recorded"
        );
        Ok(RatingReceipt { rating, rating_avg })
    }
}

#[async_trait]
impl<B, R> RatingQuery for RatingService<B, R>
where
    B: BookingRepository,
    R: RatingRepository,
{
    async fn rating_for_booking(&self, caller: &Caller, booking_id: &BookingId) -> Result<Rating, Error> {
        let rating = self
            .ratings
            .find_by_booking(booking_id)
            .await
            .map_err(map_rating_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no rating for booking {booking_id}")))?;
        if rating.customer_id() != caller.id() && caller.role() != Role::Admin {
            return Err(Error::forbidden("rating belongs to another customer"));
        }
        Ok(rating)
    }
}

#[cfg(test)]
#[path = "rating_service_tests.rs"]
mod tests;
