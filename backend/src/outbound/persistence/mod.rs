//! PostgreSQL persistence adapters using Diesel with `diesel-async`.
//!
//! Adapters only translate between rows and domain types; every decision
//! (may this balance be debited, is this transition legal) is taken by the
//! domain inside the adapter's transaction, after the rows it depends on are
//! locked.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module.
//!
//! ```no_run
//! use homeservices::outbound::persistence::{DbPool, DieselBookingRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), homeservices::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/homeservices")).await?;
//! let bookings = DieselBookingRepository::new(pool);
//! # let _ = bookings;
//! # Ok(())
//! # }
//! ```

mod diesel_booking_repository;
mod diesel_error_mapping;
mod diesel_payment_repository;
mod diesel_rating_repository;
mod diesel_service_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_rating_repository::DieselRatingRepository;
pub use diesel_service_repository::DieselServiceRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
