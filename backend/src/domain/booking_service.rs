//! Booking domain service.
//!
//! Implements the booking driving ports on top of the booking and service
//! repositories and the configured assignment policy. Opening a booking
//! resolves the provider first, then hands the repository one unit holding
//! the assigned booking, both creation events, and the debit.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::assignment::{AssignmentError, AssignmentPolicy};
use crate::domain::ports::{
    BookingCommand, BookingDetails, BookingOpening, BookingQuery, BookingRepository,
    BookingRepositoryError, CreateBookingRequest, CreatedBooking, ServiceRepository,
    ServiceRepositoryError,
};
use crate::domain::{
    Booking, BookingAction, BookingId, BookingStatus, Caller, Error, FailureReason, NewBooking,
    Role, TransitionError,
};

pub(crate) fn map_transition_error(error: TransitionError) -> Error {
    let message = error.to_string();
    match error {
        TransitionError::InvalidTransition { from, to } => Error::conflict(message)
            .with_details(json!({ "from": from, "to": to }))
            .with_reason(FailureReason::InvalidTransition),
        TransitionError::ProviderRequired { status } => Error::conflict(message)
            .with_details(json!({ "to": status }))
            .with_reason(FailureReason::ProviderRequired),
        TransitionError::NotAssignee => Error::forbidden(message).with_reason(FailureReason::NotAssignee),
        TransitionError::NotOwner => Error::forbidden(message).with_reason(FailureReason::NotOwner),
    }
}

pub(crate) fn map_booking_repository_error(error: BookingRepositoryError) -> Error {
    match error {
        BookingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("booking repository unavailable: {message}"))
        }
        BookingRepositoryError::Query { message } => {
            Error::internal(format!("booking repository error: {message}"))
        }
        BookingRepositoryError::NotFound { booking_id } => {
            Error::not_found(format!("booking {booking_id} not found"))
        }
        BookingRepositoryError::CustomerNotFound { user_id } => {
            Error::not_found(format!("customer {user_id} not found"))
        }
        BookingRepositoryError::InsufficientFunds {
            available,
            required,
        } => Error::invalid_request("insufficient credits")
            .with_details(json!({ "available": available, "required": required }))
            .with_reason(FailureReason::InsufficientFunds),
        BookingRepositoryError::Transition { reason } => map_transition_error(reason),
    }
}

pub(crate) fn map_service_repository_error(error: ServiceRepositoryError) -> Error {
    match error {
        ServiceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("service repository unavailable: {message}"))
        }
        ServiceRepositoryError::Query { message } => {
            Error::internal(format!("service repository error: {message}"))
        }
        ServiceRepositoryError::UnknownProvider { provider_id } => {
            Error::not_found(format!("provider {provider_id} not found"))
        }
    }
}

fn map_assignment_error(error: AssignmentError) -> Error {
    match error {
        AssignmentError::NoProviderAvailable { service_id } => {
            Error::conflict(format!("no provider available for service {service_id}"))
                .with_reason(FailureReason::NoProviderAvailable)
        }
        AssignmentError::Directory(inner) => {
            Error::service_unavailable(format!("provider directory unavailable: {inner}"))
        }
    }
}

/// Booking service implementing [`BookingCommand`] and [`BookingQuery`].
#[derive(Clone)]
pub struct BookingService<B, S> {
    bookings: Arc<B>,
    services: Arc<S>,
    policy: Arc<dyn AssignmentPolicy>,
    clock: Arc<dyn Clock>,
}

impl<B, S> BookingService<B, S> {
    /// Create the service with one assignment policy.
    pub fn new(
        bookings: Arc<B>,
        services: Arc<S>,
        policy: Arc<dyn AssignmentPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            services,
            policy,
            clock,
        }
    }
}

impl<B, S> BookingService<B, S>
where
    B: BookingRepository,
    S: ServiceRepository,
{
    async fn details(&self, booking: Booking) -> Result<BookingDetails, Error> {
        let history = self
            .bookings
            .history(booking.id())
            .await
            .map_err(map_booking_repository_error)?;
        Ok(BookingDetails {
            booking,
            events: history.into_events(),
        })
    }

    async fn transition(&self, booking_id: &BookingId, action: BookingAction) -> Result<BookingDetails, Error> {
        let transition = self
            .bookings
            .transition(booking_id, &action, self.clock.utc())
            .await
            .map_err(|err| {
                warn!(booking_id = %booking_id, actor = %action.actor(), error = %err, "booking transition refused");
                map_booking_repository_error(err)
            })?;
        info!(
            booking_id = %booking_id,
            from = ?transition.event.from_status(),
            to = %transition.event.to_status(),
            actor = %transition.event.actor(),
            "booking transitioned"
        );
        self.details(transition.booking).await
    }
}

#[async_trait]
impl<B, S> BookingCommand for BookingService<B, S>
where
    B: BookingRepository,
    S: ServiceRepository,
{
    async fn create_booking(&self, caller: &Caller, request: CreateBookingRequest) -> Result<CreatedBooking, Error> {
        caller.require(Role::Customer)?;
        let CreateBookingRequest {
            service_id,
            address,
            phone,
        } = request;

        let service = self
            .services
            .find_by_id(&service_id)
            .await
            .map_err(map_service_repository_error)?
            .ok_or_else(|| Error::not_found(format!("service {service_id} not found")))?;
        let provider_id = self
            .policy
            .resolve_provider(&service)
            .await
            .map_err(map_assignment_error)?;

        let now = self.clock.utc();
        let (pending, created) = Booking::open(NewBooking {
            id: BookingId::random(),
            customer_id: *caller.id(),
            service_id,
            address,
            phone,
            created_at: now,
        });
        let assigned = pending
            .apply(&BookingAction::Assign { provider_id }, now)
            .map_err(map_transition_error)?;

        let opening = BookingOpening {
            booking: assigned.booking,
            events: vec![created, assigned.event],
            cost: service.credit_cost(),
        };
        let balance = self
            .bookings
            .open_booking(&opening)
            .await
            .map_err(map_booking_repository_error)?;

        info!(
            booking_id = %opening.booking.id(),
            user_id = %caller.id(),
            provider_id = %provider_id,
            cost = opening.cost.value(),
            balance = balance.value(),
            "booking opened"
        );
        let BookingOpening { booking, events, .. } = opening;
        Ok(CreatedBooking {
            details: BookingDetails { booking, events },
            balance,
        })
    }

    async fn accept(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error> {
        caller.require(Role::Provider)?;
        self.transition(booking_id, BookingAction::Accept { provider_id: *caller.id() })
            .await
    }

    async fn reject(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error> {
        caller.require(Role::Provider)?;
        self.transition(booking_id, BookingAction::Reject { provider_id: *caller.id() })
            .await
    }

    async fn complete(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error> {
        caller.require(Role::Customer)?;
        self.transition(booking_id, BookingAction::Complete { customer_id: *caller.id() })
            .await
    }

    async fn override_status(
        &self,
        caller: &Caller,
        booking_id: &BookingId,
        status: BookingStatus,
    ) -> Result<BookingDetails, Error> {
        caller.require(Role::Admin)?;
        self.transition(booking_id, BookingAction::Override { status }).await
    }
}

#[async_trait]
impl<B, S> BookingQuery for BookingService<B, S>
where
    B: BookingRepository,
    S: ServiceRepository,
{
    async fn get_booking(&self, caller: &Caller, booking_id: &BookingId) -> Result<BookingDetails, Error> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await
            .map_err(map_booking_repository_error)?
            .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))?;

        let visible = match caller.role() {
            Role::Admin => true,
            Role::Customer => booking.customer_id() == caller.id(),
            Role::Provider => booking.is_assigned_to(caller.id()),
        };
        if !visible {
            return Err(Error::forbidden("booking belongs to another user"));
        }
        self.details(booking).await
    }

    async fn list_customer_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, Error> {
        caller.require(Role::Customer)?;
        self.bookings
            .list_for_customer(caller.id())
            .await
            .map_err(map_booking_repository_error)
    }

    async fn list_assigned_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, Error> {
        caller.require(Role::Provider)?;
        self.bookings
            .list_assigned_to(caller.id())
            .await
            .map_err(map_booking_repository_error)
    }

    async fn list_all_bookings(&self, caller: &Caller) -> Result<Vec<Booking>, Error> {
        caller.require(Role::Admin)?;
        self.bookings
            .list_all()
            .await
            .map_err(map_booking_repository_error)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
