//! PostgreSQL-backed [`RatingRepository`].
//!
//! Recording a rating locks the booking and re-checks that it is still
//! COMPLETED, locks the rated service, inserts the rating, and rewrites the
//! service's average from every rating of the same provider, all in one
//! transaction. The unique index on `ratings.booking_id` is the
//! final word on duplicates.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{RatingRepository, RatingRepositoryError};
use crate::domain::{BookingId, BookingStatus, Rating, RatingAverage, RatingValue, ServiceId};

use super::diesel_error_mapping::{TxError, is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewRatingRow, RatingRow};
use super::pool::DbPool;
use super::schema::{bookings, ratings, services};

/// Diesel adapter over the `ratings` table.
#[derive(Clone)]
pub struct DieselRatingRepository {
    pool: DbPool,
}

impl DieselRatingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn rating_error(error: diesel::result::Error) -> RatingRepositoryError {
    map_diesel_error(error, RatingRepositoryError::query, RatingRepositoryError::connection)
}

#[async_trait]
impl RatingRepository for DieselRatingRepository {
    async fn record(&self, rating: &Rating, service_id: &ServiceId) -> Result<RatingAverage, RatingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RatingRepositoryError::connection))?;
        let service = *service_id.as_uuid();
        let provider = *rating.provider_id().as_uuid();
        let booking = *rating.booking_id().as_uuid();
        let booking_id = rating.booking_id().to_string();

        let recorded: Result<RatingAverage, TxError<RatingRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let status = bookings::table
                        .find(booking)
                        .select(bookings::status)
                        .for_update()
                        .first::<String>(conn)
                        .await
                        .optional()?;
                    if status.as_deref() != Some(BookingStatus::Completed.as_str()) {
                        return Err(TxError::Refused(RatingRepositoryError::not_completed(
                            booking_id.clone(),
                        )));
                    }

                    services::table
                        .find(service)
                        .select(services::id)
                        .for_update()
                        .first::<uuid::Uuid>(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| {
                            TxError::Refused(RatingRepositoryError::query(format!(
                                "service {service} not found"
                            )))
                        })?;

                    diesel::insert_into(ratings::table)
                        .values(&NewRatingRow::from(rating))
                        .execute(conn)
                        .await
                        .map_err(|err| {
                            if is_unique_violation(&err) {
                                TxError::Refused(RatingRepositoryError::already_rated(booking_id.clone()))
                            } else {
                                TxError::Diesel(err)
                            }
                        })?;

                    let values = ratings::table
                        .filter(ratings::provider_id.eq(provider))
                        .select(ratings::rating)
                        .load::<i16>(conn)
                        .await?
                        .into_iter()
                        .map(|value| RatingValue::new(i64::from(value)))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|err| TxError::Refused(RatingRepositoryError::query(err.to_string())))?;
                    let average = RatingAverage::from_values(values);

                    diesel::update(services::table.find(service))
                        .set(services::rating_avg.eq(average.value()))
                        .execute(conn)
                        .await?;
                    Ok(average)
                }
                .scope_boxed()
            })
            .await;
        recorded.map_err(|err| err.into_port_error(rating_error))
    }

    async fn find_by_booking(&self, booking_id: &BookingId) -> Result<Option<Rating>, RatingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RatingRepositoryError::connection))?;
        let row = ratings::table
            .filter(ratings::booking_id.eq(*booking_id.as_uuid()))
            .select(RatingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(rating_error)?;
        row.map(|row| Rating::try_from(row).map_err(|err| RatingRepositoryError::query(err.to_string())))
            .transpose()
    }
}
