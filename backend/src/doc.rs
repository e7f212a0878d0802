//! OpenAPI document for the marketplace REST API.
//!
//! Paths come from the `#[utoipa::path]` annotations on the inbound handlers;
//! request and response bodies are the handlers' DTOs, and errors use the
//! [`ErrorSchema`] wrapper so domain types stay free of utoipa derives.
//! Swagger UI serves it in debug builds and `openapi-dump` prints it.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::bookings::{
    AddressBody, BookingDetailsResponse, BookingEventResponse, BookingResponse, BookingStatusBody,
    CreateBookingBody, CreatedBookingResponse, OverrideBody,
};
use crate::inbound::http::payments::{
    CreateOrderBody, OrderResponse, PaymentResponse, VerifyPaymentBody, VerifyPaymentResponse,
};
use crate::inbound::http::ratings::{AddRatingBody, RatingReceiptResponse, RatingResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::services::{CreateServiceBody, ServiceResponse};
use crate::inbound::http::users::{
    LedgerEntryResponse, LoginRequest, RoleBody, SignupBody, UserResponse,
};

/// Registers the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Home services marketplace API",
        description = "Credit-funded bookings, provider assignment, ratings, and credit purchases."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::signup,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::ledger,
        crate::inbound::http::services::list_services,
        crate::inbound::http::services::create_service,
        crate::inbound::http::services::list_provider_services,
        crate::inbound::http::services::create_provider_service,
        crate::inbound::http::bookings::create_booking,
        crate::inbound::http::bookings::list_bookings,
        crate::inbound::http::bookings::get_booking,
        crate::inbound::http::bookings::complete_booking,
        crate::inbound::http::bookings::list_assigned_bookings,
        crate::inbound::http::bookings::accept_booking,
        crate::inbound::http::bookings::reject_booking,
        crate::inbound::http::bookings::list_all_bookings,
        crate::inbound::http::bookings::override_booking_status,
        crate::inbound::http::ratings::add_rating,
        crate::inbound::http::ratings::rating_for_booking,
        crate::inbound::http::payments::create_order,
        crate::inbound::http::payments::verify_payment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        SignupBody,
        LoginRequest,
        RoleBody,
        UserResponse,
        LedgerEntryResponse,
        CreateServiceBody,
        ServiceResponse,
        AddressBody,
        BookingStatusBody,
        CreateBookingBody,
        OverrideBody,
        BookingResponse,
        BookingEventResponse,
        BookingDetailsResponse,
        CreatedBookingResponse,
        AddRatingBody,
        RatingResponse,
        RatingReceiptResponse,
        CreateOrderBody,
        OrderResponse,
        VerifyPaymentBody,
        PaymentResponse,
        VerifyPaymentResponse,
    )),
    tags(
        (name = "users", description = "Signup, login, profile, and credit journal"),
        (name = "services", description = "Service catalogue"),
        (name = "bookings", description = "Customer bookings"),
        (name = "provider", description = "Provider job inbox"),
        (name = "admin", description = "Administrative overrides"),
        (name = "ratings", description = "Post-completion ratings"),
        (name = "payments", description = "Credit purchases"),
        (name = "health", description = "Orchestrator liveness and readiness checks")
    )
)]
pub struct ApiDoc;
