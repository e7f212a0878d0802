//! Customer ratings and the provider mean derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BookingId, UserId};

/// Lowest accepted star rating.
pub const RATING_MIN: u8 = 1;
/// Highest accepted star rating.
pub const RATING_MAX: u8 = 5;

/// Raised when a submitted rating is outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between {RATING_MIN} and {RATING_MAX}, got {value}")]
pub struct InvalidRating {
    pub value: i64,
}

/// A star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Validate a raw rating.
    pub fn new(value: i64) -> Result<Self, InvalidRating> {
        u8::try_from(value)
            .ok()
            .filter(|stars| (RATING_MIN..=RATING_MAX).contains(stars))
            .map(Self)
            .ok_or(InvalidRating { value })
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = InvalidRating;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for i64 {
    fn from(value: RatingValue) -> Self {
        i64::from(value.0)
    }
}

/// Arithmetic mean of ratings rounded to two decimal places.
///
/// An empty set averages to `0.0`.
///
/// # Examples
/// ```
/// use homeservices::domain::{RatingAverage, RatingValue};
///
/// let values = [5, 4, 4].map(|v| RatingValue::new(v).expect("in range"));
/// assert_eq!(RatingAverage::from_values(values).value(), 4.33);
/// assert_eq!(RatingAverage::from_values(std::iter::empty()).value(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingAverage(f64);

impl RatingAverage {
    /// Rehydrate a stored average.
    pub const fn from_stored(value: f64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Recompute the mean of `values`.
    pub fn from_values(values: impl IntoIterator<Item = RatingValue>) -> Self {
        let (sum, count) = values
            .into_iter()
            .fold((0_u32, 0_u32), |(sum, count), value| {
                (sum + u32::from(value.value()), count + 1)
            });
        if count == 0 {
            return Self(0.0);
        }
        let mean = f64::from(sum) / f64::from(count);
        Self((mean * 100.0).round() / 100.0)
    }
}

/// Persisted fields of a [`Rating`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingDraft {
    pub id: Uuid,
    pub booking_id: BookingId,
    pub customer_id: UserId,
    pub provider_id: UserId,
    pub rating: RatingValue,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A customer's rating of a completed booking. Immutable once stored, and at
/// most one exists per booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    id: Uuid,
    booking_id: BookingId,
    customer_id: UserId,
    provider_id: UserId,
    rating: RatingValue,
    review: Option<String>,
    created_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(draft: RatingDraft) -> Self {
        let RatingDraft {
            id,
            booking_id,
            customer_id,
            provider_id,
            rating,
            review,
            created_at,
        } = draft;
        Self {
            id,
            booking_id,
            customer_id,
            provider_id,
            rating,
            review: review
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn booking_id(&self) -> &BookingId {
        &self.booking_id
    }

    pub fn customer_id(&self) -> &UserId {
        &self.customer_id
    }

    pub fn provider_id(&self) -> &UserId {
        &self.provider_id
    }

    pub fn rating(&self) -> RatingValue {
        self.rating
    }

    pub fn review(&self) -> Option<&str> {
        self.review.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn values(raw: &[i64]) -> Vec<RatingValue> {
        raw.iter()
            .map(|v| RatingValue::new(*v).expect("in range"))
            .collect()
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[case(256)]
    fn out_of_range_values_are_rejected(#[case] raw: i64) {
        assert_eq!(RatingValue::new(raw), Err(InvalidRating { value: raw }));
    }

    #[rstest]
    #[case(&[5], 5.0)]
    #[case(&[5, 4], 4.5)]
    #[case(&[1, 2, 2], 1.67)]
    #[case(&[], 0.0)]
    fn mean_is_rounded_to_two_places(#[case] raw: &[i64], #[case] expected: f64) {
        let average = RatingAverage::from_values(values(raw));
        assert!((average.value() - expected).abs() < f64::EPSILON);
    }

    #[rstest]
    fn blank_review_is_dropped() {
        let rating = Rating::new(RatingDraft {
            id: Uuid::new_v4(),
            booking_id: BookingId::random(),
            customer_id: UserId::random(),
            provider_id: UserId::random(),
            rating: RatingValue::new(4).expect("in range"),
            review: Some("  ".to_owned()),
            created_at: Utc::now(),
        });
        assert!(rating.review().is_none());
    }
}
