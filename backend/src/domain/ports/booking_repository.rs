//! Driven port for bookings, their event log, and the booking debit.
//!
//! Every mutating method is one transaction: adapters lock the rows they
//! read (the customer for an opening, the booking for a transition), decide
//! with the domain rules, then write the booking, its events, and any ledger
//! posting together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Booking, BookingAction, BookingEvent, BookingHistory, BookingId, CreditAmount, CreditBalance,
    LedgerError, Transition, TransitionError, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "booking repository query failed: {message}",
        /// No booking with this id.
        NotFound { booking_id: String } => "booking {booking_id} not found",
        /// The booking's customer account does not exist.
        CustomerNotFound { user_id: String } => "customer {user_id} not found",
        /// The customer cannot cover the service cost.
        InsufficientFunds { available: u64, required: u64 } =>
            "insufficient credits: {available} available, {required} required",
        /// The domain refused the transition.
        Transition { reason: TransitionError } => "{reason}",
    }
}

impl BookingRepositoryError {
    /// Translate a refused booking debit.
    pub fn from_debit(error: LedgerError) -> Self {
        match error {
            LedgerError::InsufficientFunds {
                available,
                required,
            } => Self::insufficient_funds(available, required),
            other => Self::query(other.to_string()),
        }
    }
}

/// A freshly opened booking ready to persist with its creation events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOpening {
    /// Booking in its post-assignment state.
    pub booking: Booking,
    /// Creation and assignment events in append order.
    pub events: Vec<BookingEvent>,
    /// Credits debited from the customer.
    pub cost: CreditAmount,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Debit the customer and insert the booking with its events.
    ///
    /// Returns the customer's balance after the debit. Nothing is written
    /// when the debit fails.
    async fn open_booking(&self, opening: &BookingOpening) -> Result<CreditBalance, BookingRepositoryError>;

    /// Apply `action` to the locked booking and append the resulting event.
    async fn transition(
        &self,
        booking_id: &BookingId,
        action: &BookingAction,
        at: DateTime<Utc>,
    ) -> Result<Transition, BookingRepositoryError>;

    async fn find_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Events for a booking in canonical order.
    async fn history(&self, booking_id: &BookingId) -> Result<BookingHistory, BookingRepositoryError>;

    /// A customer's bookings, newest first.
    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// ASSIGNED bookings awaiting a provider's answer, newest first.
    async fn list_assigned_to(&self, provider_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// All bookings, newest first.
    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError>;
}

/// Fixture repository with no bookings.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBookingRepository;

#[async_trait]
impl BookingRepository for FixtureBookingRepository {
    async fn open_booking(&self, opening: &BookingOpening) -> Result<CreditBalance, BookingRepositoryError> {
        Err(BookingRepositoryError::customer_not_found(
            opening.booking.customer_id().to_string(),
        ))
    }

    async fn transition(
        &self,
        booking_id: &BookingId,
        _action: &BookingAction,
        _at: DateTime<Utc>,
    ) -> Result<Transition, BookingRepositoryError> {
        Err(BookingRepositoryError::not_found(booking_id.to_string()))
    }

    async fn find_by_id(&self, _booking_id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(None)
    }

    async fn history(&self, _booking_id: &BookingId) -> Result<BookingHistory, BookingRepositoryError> {
        Ok(BookingHistory::default())
    }

    async fn list_for_customer(&self, _customer_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_assigned_to(&self, _provider_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError> {
        Ok(Vec::new())
    }
}
