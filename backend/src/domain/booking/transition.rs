//! Booking transition table.
//!
//! | From                  | To          | Action   | Actor    |
//! |-----------------------|-------------|----------|----------|
//! | PENDING               | ASSIGNED    | Assign   | SYSTEM   |
//! | ASSIGNED              | IN_PROGRESS | Accept   | PROVIDER |
//! | ASSIGNED              | PENDING     | Reject   | PROVIDER |
//! | ASSIGNED, IN_PROGRESS | COMPLETED   | Complete | CUSTOMER |
//! | any                   | any other   | Override | ADMIN    |

use chrono::{DateTime, Utc};

use super::{Actor, Booking, BookingEvent, BookingStatus};
use crate::domain::UserId;

/// A request to move a booking along its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingAction {
    /// Automatic assignment to a resolved provider.
    Assign { provider_id: UserId },
    /// The assigned provider takes the job.
    Accept { provider_id: UserId },
    /// The assigned provider declines; the booking returns to the pool.
    Reject { provider_id: UserId },
    /// The booking's customer confirms the job is done.
    Complete { customer_id: UserId },
    /// Admin escape hatch forcing a status.
    Override { status: BookingStatus },
}

impl BookingAction {
    /// Actor recorded on the resulting event.
    pub const fn actor(&self) -> Actor {
        match self {
            Self::Assign { .. } => Actor::System,
            Self::Accept { .. } | Self::Reject { .. } => Actor::Provider,
            Self::Complete { .. } => Actor::Customer,
            Self::Override { .. } => Actor::Admin,
        }
    }
}

/// Reasons a transition is refused. None of them mutate the booking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The edge is not in the transition table for the current status.
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    /// The caller is not the provider assigned to the booking.
    #[error("booking is not assigned to this provider")]
    NotAssignee,
    /// The caller is not the customer who made the booking.
    #[error("booking belongs to another customer")]
    NotOwner,
    /// The target status needs a provider and the booking has none.
    #[error("{status} requires an assigned provider")]
    ProviderRequired { status: BookingStatus },
}

/// An accepted transition: the updated booking and its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub booking: Booking,
    pub event: BookingEvent,
}

impl Booking {
    /// Apply `action` at time `at`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use homeservices::domain::{
    ///     Actor, Booking, BookingAction, BookingId, BookingStatus, NewBooking, PhoneNumber,
    ///     ServiceAddress, ServiceId, UserId,
    /// };
    ///
    /// let now = Utc::now();
    /// let (booking, _) = Booking::open(NewBooking {
    ///     id: BookingId::random(),
    ///     customer_id: UserId::random(),
    ///     service_id: ServiceId::random(),
    ///     address: ServiceAddress::new("12B", None, "Home").expect("address"),
    ///     phone: PhoneNumber::new("9876543210").expect("phone"),
    ///     created_at: now,
    /// });
    /// let provider = UserId::random();
    /// let assigned = booking
    ///     .apply(&BookingAction::Assign { provider_id: provider }, now)
    ///     .expect("pending bookings can be assigned");
    /// assert_eq!(assigned.booking.status(), BookingStatus::Assigned);
    /// assert_eq!(assigned.event.actor(), Actor::System);
    /// ```
    pub fn apply(&self, action: &BookingAction, at: DateTime<Utc>) -> Result<Transition, TransitionError> {
        let from = self.status;
        let (to, provider_id) = match action {
            BookingAction::Assign { provider_id } => {
                self.expect_status(&[BookingStatus::Pending], BookingStatus::Assigned)?;
                (BookingStatus::Assigned, Some(*provider_id))
            }
            BookingAction::Accept { provider_id } => {
                self.expect_assignee(provider_id)?;
                self.expect_status(&[BookingStatus::Assigned], BookingStatus::InProgress)?;
                (BookingStatus::InProgress, self.provider_id)
            }
            BookingAction::Reject { provider_id } => {
                self.expect_assignee(provider_id)?;
                self.expect_status(&[BookingStatus::Assigned], BookingStatus::Pending)?;
                (BookingStatus::Pending, None)
            }
            BookingAction::Complete { customer_id } => {
                if &self.customer_id != customer_id {
                    return Err(TransitionError::NotOwner);
                }
                self.expect_status(
                    &[BookingStatus::Assigned, BookingStatus::InProgress],
                    BookingStatus::Completed,
                )?;
                (BookingStatus::Completed, self.provider_id)
            }
            BookingAction::Override { status } => self.override_target(*status)?,
        };

        let booking = Self {
            provider_id,
            status: to,
            ..self.clone()
        };
        let event = BookingEvent::record(self.id, Some(from), to, action.actor(), at);
        Ok(Transition { booking, event })
    }

    fn expect_status(&self, allowed: &[BookingStatus], to: BookingStatus) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    fn expect_assignee(&self, provider_id: &UserId) -> Result<(), TransitionError> {
        if self.is_assigned_to(provider_id) {
            Ok(())
        } else {
            Err(TransitionError::NotAssignee)
        }
    }

    fn override_target(
        &self,
        status: BookingStatus,
    ) -> Result<(BookingStatus, Option<UserId>), TransitionError> {
        if status == self.status {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        if status == BookingStatus::Pending {
            return Ok((status, None));
        }
        if status.requires_provider() && self.provider_id.is_none() {
            return Err(TransitionError::ProviderRequired { status });
        }
        Ok((status, self.provider_id))
    }
}
