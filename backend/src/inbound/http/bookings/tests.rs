//! Booking lifecycle over HTTP against the in-memory store.

use std::sync::Arc;

use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::inbound::http::services::ServiceResponse as ListingResponse;
use crate::inbound::http::test_utils::{
    ADMIN_EMAIL, CUSTOMER_EMAIL, PROVIDER_EMAIL, api_app, memory_state, sign_in,
};
use crate::outbound::memory::InMemoryMarketplace;

struct Parties {
    customer: Cookie<'static>,
    provider: Cookie<'static>,
    admin: Cookie<'static>,
    service_id: Uuid,
}

async fn parties<S>(app: &S, cost: i64) -> Parties
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let provider = sign_in(app, PROVIDER_EMAIL).await;
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/provider/services")
            .cookie(provider.clone())
            .set_json(json!({ "title": "AC repair", "category": "Repair", "creditCost": cost }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let listing: ListingResponse = test::read_body_json(res).await;
    Parties {
        customer: sign_in(app, CUSTOMER_EMAIL).await,
        provider,
        admin: sign_in(app, ADMIN_EMAIL).await,
        service_id: listing.id,
    }
}

fn booking_body(service_id: Uuid) -> Value {
    json!({
        "serviceId": service_id,
        "address": { "houseNumber": "12B", "landmark": "Near the park", "label": "Home" },
        "phone": "+91 98765 43210"
    })
}

async fn book<S>(app: &S, parties: &Parties) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/bookings")
            .cookie(parties.customer.clone())
            .set_json(booking_body(parties.service_id))
            .to_request(),
    )
    .await
}

async fn post_as<S>(app: &S, cookie: &Cookie<'static>, uri: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    test::call_service(
        app,
        test::TestRequest::post().uri(uri).cookie(cookie.clone()).to_request(),
    )
    .await
}

#[actix_web::test]
async fn booking_debits_and_assigns_the_owner() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 40).await;

    let res = book(&app, &parties).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: CreatedBookingResponse = test::read_body_json(res).await;
    assert_eq!(created.credits, 60);
    assert_eq!(created.booking.status, BookingStatusBody::Assigned);
    assert!(created.booking.provider_id.is_some());
    assert_eq!(created.booking.address.landmark.as_deref(), Some("Near the park"));

    let statuses: Vec<_> = created
        .events
        .iter()
        .map(|event| (event.from_status, event.to_status, event.actor.as_str()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (None, BookingStatusBody::Pending, "CUSTOMER"),
            (Some(BookingStatusBody::Pending), BookingStatusBody::Assigned, "SYSTEM"),
        ]
    );

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/ledger")
            .cookie(parties.customer.clone())
            .to_request(),
    )
    .await;
    let ledger: Value = test::read_body_json(res).await;
    let last = ledger.as_array().and_then(|entries| entries.last()).cloned();
    let last = last.expect("debit entry");
    assert_eq!(last["kind"], "BOOKING_DEBIT");
    assert_eq!(last["amount"], 40);
    assert_eq!(last["balanceAfter"], 60);
    assert_eq!(last["reference"], created.booking.id.to_string());
}

#[actix_web::test]
async fn insufficient_credits_leave_no_trace() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 150).await;

    let res = book(&app, &parties).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/bookings")
            .cookie(parties.customer.clone())
            .to_request(),
    )
    .await;
    let bookings: Vec<BookingResponse> = test::read_body_json(res).await;
    assert!(bookings.is_empty());

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(parties.customer.clone())
            .to_request(),
    )
    .await;
    let me: Value = test::read_body_json(res).await;
    assert_eq!(me["credits"], 100);
}

#[actix_web::test]
async fn accept_then_complete_records_every_step() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 40).await;
    let created: CreatedBookingResponse = test::read_body_json(book(&app, &parties).await).await;
    let id = created.booking.id;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/provider/bookings")
            .cookie(parties.provider.clone())
            .to_request(),
    )
    .await;
    let assigned: Vec<BookingResponse> = test::read_body_json(res).await;
    assert_eq!(assigned.iter().map(|booking| booking.id).collect::<Vec<_>>(), vec![id]);

    let res = post_as(&app, &parties.provider, &format!("/api/v1/provider/bookings/{id}/accept")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let accepted: BookingDetailsResponse = test::read_body_json(res).await;
    assert_eq!(accepted.booking.status, BookingStatusBody::InProgress);

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/bookings/{id}/complete"))
            .cookie(parties.customer.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let completed: BookingDetailsResponse = test::read_body_json(res).await;
    assert_eq!(completed.booking.status, BookingStatusBody::Completed);
    assert_eq!(completed.events.len(), 4);
    assert_eq!(
        completed.events.last().map(|event| event.actor.as_str()),
        Some("CUSTOMER")
    );
}

#[actix_web::test]
async fn reject_returns_booking_to_pending() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 40).await;
    let created: CreatedBookingResponse = test::read_body_json(book(&app, &parties).await).await;
    let id = created.booking.id;

    let res = post_as(&app, &parties.provider, &format!("/api/v1/provider/bookings/{id}/reject")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let rejected: BookingDetailsResponse = test::read_body_json(res).await;
    assert_eq!(rejected.booking.status, BookingStatusBody::Pending);
    assert!(rejected.booking.provider_id.is_none());
    assert_eq!(rejected.events.len(), 3);

    let res = post_as(&app, &parties.provider, &format!("/api/v1/provider/bookings/{id}/accept")).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn completing_a_pending_booking_conflicts() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 40).await;
    let created: CreatedBookingResponse = test::read_body_json(book(&app, &parties).await).await;
    let id = created.booking.id;
    post_as(&app, &parties.provider, &format!("/api/v1/provider/bookings/{id}/reject")).await;

    let res = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/bookings/{id}/complete"))
            .cookie(parties.customer.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[case("CANCELLED", StatusCode::OK)]
#[case("ASSIGNED", StatusCode::CONFLICT)]
#[case("COMPLETED", StatusCode::OK)]
#[actix_rt::test]
async fn admin_override_from_assigned(#[case] target: &str, #[case] expected: StatusCode) {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 40).await;
    let created: CreatedBookingResponse = test::read_body_json(book(&app, &parties).await).await;
    let id = created.booking.id;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/admin/bookings/{id}/override"))
            .cookie(parties.admin.clone())
            .set_json(json!({ "status": target }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), expected);
    if expected == StatusCode::OK {
        let details: BookingDetailsResponse = test::read_body_json(res).await;
        let last = details.events.last().map(|event| event.actor.clone());
        assert_eq!(last.as_deref(), Some("ADMIN"));
    }
}

#[actix_web::test]
async fn override_requires_admin() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let parties = parties(&app, 40).await;
    let created: CreatedBookingResponse = test::read_body_json(book(&app, &parties).await).await;
    let id = created.booking.id;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/admin/bookings/{id}/override"))
            .cookie(parties.customer.clone())
            .set_json(json!({ "status": "CANCELLED" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/admin/bookings")
            .cookie(parties.admin.clone())
            .to_request(),
    )
    .await;
    let all: Vec<BookingResponse> = test::read_body_json(res).await;
    assert_eq!(all.len(), 1);
}

#[actix_web::test]
async fn malformed_booking_id_is_rejected() {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    let app = test::init_service(api_app(memory_state(&store))).await;
    let cookie = sign_in(&app, CUSTOMER_EMAIL).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/bookings/not-a-uuid")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "bookingId");
    assert_eq!(body["details"]["code"], "invalid_uuid");
}
