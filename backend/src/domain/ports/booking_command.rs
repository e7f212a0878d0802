//! Driving port for booking mutations.
//!
//! Provider, customer, and admin actions all enter the state machine through
//! this port.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{
    Booking, BookingEvent, BookingId, BookingStatus, Caller, CreditBalance, Error, PhoneNumber,
    ServiceAddress, ServiceId,
};

/// Validated booking request from a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingRequest {
    pub service_id: ServiceId,
    pub address: ServiceAddress,
    pub phone: PhoneNumber,
}

/// A booking with its full event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub booking: Booking,
    pub events: Vec<BookingEvent>,
}

/// Result of opening a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBooking {
    #[serde(flatten)]
    pub details: BookingDetails,
    /// Customer balance after the debit.
    pub balance: CreditBalance,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Open, debit, and auto-assign a booking as one unit.
    async fn create_booking(&self, caller: &Caller, request: CreateBookingRequest) -> Result<CreatedBooking, Error>;

    /// Assigned provider takes the job.
    async fn accept(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error>;

    /// Assigned provider declines the job.
    async fn reject(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error>;

    /// Customer marks the job done.
    async fn complete(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error>;

    /// Admin forces a status.
    async fn override_status(
        &self,
        caller: &Caller,
        booking_id: &BookingId,
        status: BookingStatus,
    ) -> Result<BookingDetails, Error>;
}
