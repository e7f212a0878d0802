//! HTTP inbound adapter exposing the marketplace REST endpoints.
//!
//! Handlers resolve the caller from the session cookie, translate JSON bodies
//! into validated domain requests, and delegate to the driving ports held in
//! [`state::HttpState`]. Role checks happen in the domain services.

use actix_web::web;

pub mod bookings;
pub mod error;
pub mod health;
pub mod payments;
pub mod ratings;
pub mod schemas;
pub mod services;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// The caller wraps the surrounding scope with session middleware.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::signup)
        .service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(users::ledger)
        .service(services::list_services)
        .service(services::create_service)
        .service(services::list_provider_services)
        .service(services::create_provider_service)
        .service(bookings::create_booking)
        .service(bookings::list_bookings)
        .service(bookings::get_booking)
        .service(bookings::complete_booking)
        .service(bookings::list_assigned_bookings)
        .service(bookings::accept_booking)
        .service(bookings::reject_booking)
        .service(bookings::list_all_bookings)
        .service(bookings::override_booking_status)
        .service(ratings::add_rating)
        .service(ratings::rating_for_booking)
        .service(payments::create_order)
        .service(payments::verify_payment);
}
