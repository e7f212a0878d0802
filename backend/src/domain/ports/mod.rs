//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports are called by inbound adapters; driven ports are
//! implemented by outbound adapters. Driven ports return strongly typed
//! errors generated by [`define_port_error`].

mod macros;
pub(crate) use macros::define_port_error;

mod booking_command;
mod booking_query;
mod booking_repository;
mod catalogue_command;
mod ledger_repository;
mod login_service;
mod payment_command;
mod payment_gateway;
mod payment_repository;
mod provider_directory;
mod rating_command;
mod rating_repository;
mod service_repository;
mod signup_command;
mod user_profile_query;
mod user_repository;

#[cfg(test)]
pub use booking_command::MockBookingCommand;
pub use booking_command::{BookingCommand, BookingDetails, CreateBookingRequest, CreatedBooking};
#[cfg(test)]
pub use booking_query::MockBookingQuery;
pub use booking_query::BookingQuery;
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{
    BookingOpening, BookingRepository, BookingRepositoryError, FixtureBookingRepository,
};
#[cfg(test)]
pub use catalogue_command::{MockCatalogueCommand, MockCatalogueQuery};
pub use catalogue_command::{CatalogueCommand, CatalogueQuery, CreateServiceRequest};
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
pub use ledger_repository::{FixtureLedgerRepository, LedgerRepository, LedgerRepositoryError};
pub use login_service::{DEMO_ACCOUNTS, DEMO_PASSWORD, DemoAccount, LoginService};
#[cfg(test)]
pub use payment_command::MockPaymentCommand;
pub use payment_command::{PaymentCommand, PaymentOrder, PaymentReceipt, VerifyPaymentRequest};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    ExternalOrder, FixturePaymentGateway, OrderRequest, PaymentGateway, PaymentGatewayError,
};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::{
    FixturePaymentRepository, PaymentRepository, PaymentRepositoryError, Settlement,
};
#[cfg(test)]
pub use provider_directory::MockProviderDirectory;
pub use provider_directory::{
    FixtureProviderDirectory, ProviderDirectory, ProviderDirectoryError,
};
#[cfg(test)]
pub use rating_command::{MockRatingCommand, MockRatingQuery};
pub use rating_command::{AddRatingRequest, RatingCommand, RatingQuery, RatingReceipt};
#[cfg(test)]
pub use rating_repository::MockRatingRepository;
pub use rating_repository::{FixtureRatingRepository, RatingRepository, RatingRepositoryError};
#[cfg(test)]
pub use service_repository::MockServiceRepository;
pub use service_repository::{
    FixtureServiceRepository, ServiceRepository, ServiceRepositoryError,
};
#[cfg(test)]
pub use signup_command::MockSignupCommand;
pub use signup_command::{SignupCommand, SignupRequest};
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::UserProfileQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
