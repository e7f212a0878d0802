//! PostgreSQL-backed [`BookingRepository`].
//!
//! Opening a booking and applying a transition each run in one transaction.
//! The customer row (for the debit) or the booking row (for a transition) is
//! locked with `SELECT ... FOR UPDATE` before the domain decides, so two
//! concurrent requests for the same balance or booking serialize on that lock
//! and the second one decides against the first one's committed result.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{BookingOpening, BookingRepository, BookingRepositoryError};
use crate::domain::{
    Booking, BookingAction, BookingEvent, BookingHistory, BookingId, BookingStatus, CreditBalance,
    Ledger, Transition, UserId,
};

use super::diesel_error_mapping::{TxError, map_diesel_error, map_pool_error};
use super::models::{
    BookingEventRow, BookingRow, BookingStatusUpdate, NewBookingEventRow, NewBookingRow,
    NewLedgerEntryRow,
};
use super::pool::DbPool;
use super::schema::{booking_events, bookings, ledger_entries, users};

/// Diesel adapter over `bookings`, `booking_events`, and the booking debit.
#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn booking_error(error: diesel::result::Error) -> BookingRepositoryError {
    map_diesel_error(error, BookingRepositoryError::query, BookingRepositoryError::connection)
}

fn row_to_booking(row: BookingRow) -> Result<Booking, BookingRepositoryError> {
    Booking::try_from(row).map_err(|err| BookingRepositoryError::query(err.to_string()))
}

fn rows_to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingRepositoryError> {
    rows.into_iter().map(row_to_booking).collect()
}

fn refused(error: BookingRepositoryError) -> TxError<BookingRepositoryError> {
    TxError::Refused(error)
}

async fn append_events(
    conn: &mut AsyncPgConnection,
    events: &[BookingEvent],
) -> Result<(), diesel::result::Error> {
    let rows: Vec<NewBookingEventRow<'static>> = events.iter().map(NewBookingEventRow::from).collect();
    // One statement keeps the append order, and so `seq`, stable.
    diesel::insert_into(booking_events::table)
        .values(&rows)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn open_booking(&self, opening: &BookingOpening) -> Result<CreditBalance, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let booking = &opening.booking;
        let customer_id = *booking.customer_id().as_uuid();

        let opened: Result<CreditBalance, TxError<BookingRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let stored = users::table
                        .find(customer_id)
                        .select(users::credits)
                        .for_update()
                        .first::<i64>(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| {
                            refused(BookingRepositoryError::customer_not_found(
                                booking.customer_id().to_string(),
                            ))
                        })?;
                    let balance = CreditBalance::try_from_stored(stored)
                        .map_err(|err| refused(BookingRepositoryError::query(err.to_string())))?;

                    let posting = Ledger::debit(
                        booking.customer_id(),
                        balance,
                        opening.cost,
                        booking.id().to_string(),
                        booking.created_at(),
                    )
                    .map_err(|err| refused(BookingRepositoryError::from_debit(err)))?;
                    let next = posting
                        .balance
                        .to_stored()
                        .map_err(|err| refused(BookingRepositoryError::query(err.to_string())))?;
                    let entry = NewLedgerEntryRow::try_from(&posting.entry)
                        .map_err(|err| refused(BookingRepositoryError::query(err.to_string())))?;

                    diesel::update(users::table.find(customer_id))
                        .set(users::credits.eq(next))
                        .execute(conn)
                        .await?;
                    diesel::insert_into(ledger_entries::table)
                        .values(&entry)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(bookings::table)
                        .values(&NewBookingRow::from(booking))
                        .execute(conn)
                        .await?;
                    append_events(conn, &opening.events).await?;

                    debug!(booking_id = %booking.id(), balance = posting.balance.value(), "booking persisted");
                    Ok(posting.balance)
                }
                .scope_boxed()
            })
            .await;
        opened.map_err(|err| err.into_port_error(booking_error))
    }

    async fn transition(
        &self,
        booking_id: &BookingId,
        action: &BookingAction,
        at: DateTime<Utc>,
    ) -> Result<Transition, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let id = *booking_id.as_uuid();

        let applied: Result<Transition, TxError<BookingRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let row = bookings::table
                        .find(id)
                        .select(BookingRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| refused(BookingRepositoryError::not_found(booking_id.to_string())))?;
                    let current = row_to_booking(row).map_err(refused)?;
                    let transition = current
                        .apply(action, at)
                        .map_err(|err| refused(BookingRepositoryError::transition(err)))?;

                    let next = &transition.booking;
                    diesel::update(bookings::table.find(id))
                        .set(&BookingStatusUpdate {
                            status: next.status().as_str(),
                            provider_id: next.provider_id().map(|provider| *provider.as_uuid()),
                        })
                        .execute(conn)
                        .await?;
                    append_events(conn, std::slice::from_ref(&transition.event)).await?;
                    Ok(transition)
                }
                .scope_boxed()
            })
            .await;
        applied.map_err(|err| err.into_port_error(booking_error))
    }

    async fn find_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let row = bookings::table
            .find(*booking_id.as_uuid())
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(booking_error)?;
        row.map(row_to_booking).transpose()
    }

    async fn history(&self, booking_id: &BookingId) -> Result<BookingHistory, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let rows = booking_events::table
            .filter(booking_events::booking_id.eq(*booking_id.as_uuid()))
            .order((booking_events::created_at.asc(), booking_events::seq.asc()))
            .select(BookingEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(booking_error)?;
        let events = rows
            .into_iter()
            .map(|row| BookingEvent::try_from(row).map_err(|err| BookingRepositoryError::query(err.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BookingHistory::new(events))
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let rows = bookings::table
            .filter(bookings::customer_id.eq(*customer_id.as_uuid()))
            .order((bookings::created_at.desc(), bookings::id.desc()))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(booking_error)?;
        rows_to_bookings(rows)
    }

    async fn list_assigned_to(&self, provider_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let provider: Uuid = *provider_id.as_uuid();
        let rows = bookings::table
            .filter(bookings::provider_id.eq(provider))
            .filter(bookings::status.eq(BookingStatus::Assigned.as_str()))
            .order((bookings::created_at.desc(), bookings::id.desc()))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(booking_error)?;
        rows_to_bookings(rows)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookingRepositoryError::connection))?;
        let rows = bookings::table
            .order((bookings::created_at.desc(), bookings::id.desc()))
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(booking_error)?;
        rows_to_bookings(rows)
    }
}
