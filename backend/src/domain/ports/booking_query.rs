//! Driving port for booking reads.

use async_trait::async_trait;

use crate::domain::{Booking, BookingId, Caller, Error};

use super::BookingDetails;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// A booking and its events, visible to its customer, its assigned
    /// provider, and admins.
    async fn get_booking(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error>;

    /// The caller's own bookings, newest first.
    async fn list_customer_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, Error>;

    /// Bookings waiting on the calling provider.
    async fn list_assigned_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, Error>;

    /// Every booking (admin only).
    async fn list_all_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, Error>;
}
