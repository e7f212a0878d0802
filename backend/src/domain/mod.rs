//! Domain primitives, aggregates, and services.
//!
//! Purpose: model the marketplace core (bookings and their state machine,
//! the credit ledger, ratings, payments) independently of HTTP and storage.
//! Entities keep their fields private and enforce invariants in their
//! constructors; services implement the driving ports in [`ports`].
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failure payload.
//! - [`Booking`], [`BookingAction`], [`BookingHistory`]: lifecycle state
//!   machine and its event log.
//! - [`Ledger`], [`CreditBalance`], [`LedgerEntry`]: balance arithmetic and
//!   journal.
//! - [`RatingAverage`], [`PaymentSignatureVerifier`]: aggregation and
//!   gateway verification.

pub mod account_service;
pub mod assignment;
pub mod auth;
pub mod booking;
pub mod booking_service;
pub mod catalogue;
pub mod catalogue_service;
pub mod error;
pub mod identifiers;
pub mod ledger;
pub mod payment;
pub mod payment_service;
pub mod ports;
pub mod rating;
pub mod rating_service;
pub mod trace_id;
pub mod user;
pub mod user_profile_service;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::account_service::AccountService;
pub use self::assignment::{
    AssignmentError, AssignmentPolicy, AssignmentPolicyKind, FirstAvailableProviderPolicy,
    ServiceOwnerPolicy,
};
pub use self::auth::{CredentialHasher, LoginCredentials, LoginValidationError};
pub use self::booking::{
    Actor, Booking, BookingAction, BookingDraft, BookingEvent, BookingEventDraft, BookingHistory,
    BookingStatus, BookingValidationError, NewBooking, PhoneNumber, ServiceAddress, Transition,
    TransitionError, UnknownStatus,
};
pub use self::booking_service::BookingService;
pub use self::catalogue::{Service, ServiceDraft, ServiceValidationError};
pub use self::catalogue_service::CatalogueService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, FailureReason};
pub use self::identifiers::{BookingId, IdentifierError, ServiceId, UserId};
pub use self::ledger::{
    CreditAmount, CreditBalance, Ledger, LedgerEntry, LedgerEntryDraft, LedgerEntryKind,
    LedgerError, OPENING_BALANCE_REFERENCE, Posting,
};
pub use self::payment::{
    MINOR_UNITS_PER_CREDIT, ORDER_CURRENCY, Payment, PaymentDraft, PaymentSignatureVerifier,
    PaymentStatus, SignatureMismatch, order_amount_minor,
};
pub use self::payment_service::PaymentService;
pub use self::rating::{
    InvalidRating, RATING_MAX, RATING_MIN, Rating, RatingAverage, RatingDraft, RatingValue,
};
pub use self::rating_service::RatingService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Caller, Role, UnknownRole, User};
pub use self::user_profile_service::UserProfileService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use homeservices::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
