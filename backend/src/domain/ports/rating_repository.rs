//! Driven port for ratings and the derived service average.

use async_trait::async_trait;

use crate::domain::{BookingId, Rating, RatingAverage, ServiceId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rating repository adapters.
    pub enum RatingRepositoryError {
        Connection { message: String } => "rating repository connection failed: {message}",
        Query { message: String } => "rating repository query failed: {message}",
        /// A rating already exists for the booking.
        AlreadyRated { booking_id: String } => "booking {booking_id} is already rated",
        /// The booking is missing or no longer COMPLETED.
        NotCompleted { booking_id: String } => "booking {booking_id} is not completed",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert `rating`, recompute the provider's mean over all their ratings,
    /// and store it on `service_id`, in one transaction.
    ///
    /// The booking's status is re-read under the same lock, so a concurrent
    /// override away from COMPLETED yields
    /// [`RatingRepositoryError::NotCompleted`]. Fails with
    /// [`RatingRepositoryError::AlreadyRated`] without touching the average
    /// when the booking already has a rating.
    async fn record(&self, rating: &Rating, service_id: &ServiceId) -> Result<RatingAverage, RatingRepositoryError>;

    async fn find_by_booking(&self, booking_id: &BookingId) -> Result<Option<Rating>, RatingRepositoryError>;
}

/// Fixture repository that accepts ratings and stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRatingRepository;

#[async_trait]
impl RatingRepository for FixtureRatingRepository {
    async fn record(&self, rating: &Rating, _service_id: &ServiceId) -> Result<RatingAverage, RatingRepositoryError> {
        Ok(RatingAverage::from_values([rating.rating()]))
    }

    async fn find_by_booking(&self, _booking_id: &BookingId) -> Result<Option<Rating>, RatingRepositoryError> {
        Ok(None)
    }
}
