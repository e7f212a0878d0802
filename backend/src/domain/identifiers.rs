//! Strongly typed UUID identifiers for marketplace entities.

use std::fmt;

/// Raised when an identifier string is not a canonical UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The input was blank.
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },
    /// The input could not be parsed as a UUID.
    #[error("{kind} must be a valid UUID")]
    Invalid { kind: &'static str },
}

macro_rules! define_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Parse an identifier from its string form.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdentifierError> {
                let raw = id.as_ref();
                if raw.trim().is_empty() {
                    return Err(IdentifierError::Empty { kind: $kind });
                }
                uuid::Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdentifierError::Invalid { kind: $kind })
            }

            /// Generate a random identifier.
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Borrow the underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_identifier!(
    /// Identifier of a customer, provider, or admin account.
    UserId,
    "user id"
);
define_identifier!(
    /// Identifier of a bookable service listing.
    ServiceId,
    "service id"
);
define_identifier!(
    /// Identifier of a booking.
    BookingId,
    "booking id"
);
