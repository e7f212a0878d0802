//! Driving ports for submitting and reading ratings.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{BookingId, Caller, Error, Rating, RatingAverage};

/// A customer's rating submission. `rating` is validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRatingRequest {
    pub booking_id: BookingId,
    pub rating: i64,
    pub review: Option<String>,
}

/// Stored rating plus the recomputed service average.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingReceipt {
    pub rating: Rating,
    pub rating_avg: RatingAverage,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingCommand: Send + Sync {
    async fn add_rating(&self, caller: &Caller, request: AddRatingRequest) -> Result<RatingReceipt, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingQuery: Send + Sync {
    /// The rating left on one of the caller's bookings.
    async fn rating_for_booking(&self, caller: &Caller, booking_id: &BookingId) -> Result<Rating, Error>;
}
