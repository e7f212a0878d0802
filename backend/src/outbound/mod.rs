//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel and `diesel-async`.
//! - **memory**: a mutex-guarded store implementing the same repositories,
//!   used when no database is configured and throughout the tests.
//! - **gateway**: payment gateway adapter issuing order references.
//!
//! Adapters translate between domain types and infrastructure shapes; the
//! business rules they apply are the domain's own.

pub mod gateway;
pub mod memory;
pub mod persistence;
