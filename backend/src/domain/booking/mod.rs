//! Bookings and their lifecycle.
//!
//! A booking's status only moves through [`Booking::apply`], which checks the
//! transition table and returns the updated booking together with the event
//! recording the edge. Adapters persist both or neither.

mod event;
mod transition;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{BookingId, ServiceId, UserId};

pub use event::{Actor, BookingEvent, BookingEventDraft, BookingHistory};
pub use transition::{BookingAction, Transition, TransitionError};

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Stable storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// No normal transition leaves this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// A booking in this status must carry a provider.
    pub const fn requires_provider(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::Completed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a status string is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// Validation failures for booking input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    #[error("house number must not be empty")]
    EmptyHouseNumber,
    #[error("address label must not be empty")]
    EmptyAddressLabel,
    #[error("phone number must be 7 to 15 digits with an optional leading +")]
    InvalidPhone,
    #[error("{status} bookings must have a provider")]
    MissingProvider { status: BookingStatus },
}

impl BookingValidationError {
    /// Request field the failure refers to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHouseNumber => "address.houseNumber",
            Self::EmptyAddressLabel => "address.label",
            Self::InvalidPhone => "phone",
            Self::MissingProvider { .. } => "providerId",
        }
    }
}

/// Where the job takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddress {
    house_number: String,
    landmark: Option<String>,
    label: String,
}

impl ServiceAddress {
    /// Validate address parts. Blank landmarks are dropped.
    pub fn new(
        house_number: &str,
        landmark: Option<&str>,
        label: &str,
    ) -> Result<Self, BookingValidationError> {
        let house_number = house_number.trim();
        if house_number.is_empty() {
            return Err(BookingValidationError::EmptyHouseNumber);
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(BookingValidationError::EmptyAddressLabel);
        }
        Ok(Self {
            house_number: house_number.to_owned(),
            landmark: landmark
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
            label: label.to_owned(),
        })
    }

    pub fn house_number(&self) -> &str {
        self.house_number.as_str()
    }

    pub fn landmark(&self) -> Option<&str> {
        self.landmark.as_deref()
    }

    /// Short name such as "Home" or "Office".
    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+?[0-9]{7,15}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// Contact number with spaces and dashes stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// # Examples
    /// ```
    /// use homeservices::domain::PhoneNumber;
    ///
    /// let phone = PhoneNumber::new("+91 98765-43210").expect("valid");
    /// assert_eq!(phone.as_ref(), "+919876543210");
    /// assert!(PhoneNumber::new("12ab").is_err());
    /// ```
    pub fn new(raw: &str) -> Result<Self, BookingValidationError> {
        let compact: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if phone_regex().is_match(&compact) {
            Ok(Self(compact))
        } else {
            Err(BookingValidationError::InvalidPhone)
        }
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = BookingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// Fields needed to open a new booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub id: BookingId,
    pub customer_id: UserId,
    pub service_id: ServiceId,
    pub address: ServiceAddress,
    pub phone: PhoneNumber,
    pub created_at: DateTime<Utc>,
}

/// Stored booking fields, used to rehydrate from persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub id: BookingId,
    pub customer_id: UserId,
    pub service_id: ServiceId,
    pub provider_id: Option<UserId>,
    pub status: BookingStatus,
    pub address: ServiceAddress,
    pub phone: PhoneNumber,
    pub created_at: DateTime<Utc>,
}

/// A customer's booking of a service.
///
/// ## Invariants
/// - `provider_id` is set whenever `status` is ASSIGNED, IN_PROGRESS, or
///   COMPLETED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    id: BookingId,
    customer_id: UserId,
    service_id: ServiceId,
    provider_id: Option<UserId>,
    status: BookingStatus,
    address: ServiceAddress,
    phone: PhoneNumber,
    created_at: DateTime<Utc>,
}

impl Booking {
    /// Rehydrate a stored booking, enforcing the provider invariant.
    pub fn from_draft(draft: BookingDraft) -> Result<Self, BookingValidationError> {
        let BookingDraft {
            id,
            customer_id,
            service_id,
            provider_id,
            status,
            address,
            phone,
            created_at,
        } = draft;
        if status.requires_provider() && provider_id.is_none() {
            return Err(BookingValidationError::MissingProvider { status });
        }
        Ok(Self {
            id,
            customer_id,
            service_id,
            provider_id,
            status,
            address,
            phone,
            created_at,
        })
    }

    /// Open a PENDING booking and the creation event attributed to the
    /// customer.
    pub fn open(new: NewBooking) -> (Self, BookingEvent) {
        let NewBooking {
            id,
            customer_id,
            service_id,
            address,
            phone,
            created_at,
        } = new;
        let booking = Self {
            id,
            customer_id,
            service_id,
            provider_id: None,
            status: BookingStatus::Pending,
            address,
            phone,
            created_at,
        };
        let event = BookingEvent::record(id, None, BookingStatus::Pending, Actor::Customer, created_at);
        (booking, event)
    }

    pub fn id(&self) -> &BookingId {
        &self.id
    }

    pub fn customer_id(&self) -> &UserId {
        &self.customer_id
    }

    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    pub fn provider_id(&self) -> Option<&UserId> {
        self.provider_id.as_ref()
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether `user` is the provider currently assigned.
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.provider_id.as_ref() == Some(user)
    }
}
