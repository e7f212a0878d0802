//! Full marketplace journey over HTTP: login, listing, booking lifecycle,
//! rating, credit purchase, and the journal that records it all.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::{Value, json};

use homeservices::domain::ports::DEMO_PASSWORD;
use homeservices::domain::{AssignmentPolicyKind, CredentialHasher, PaymentSignatureVerifier};
use homeservices::inbound::http::configure_api;
use homeservices::inbound::http::state::{HttpState, MarketplaceAdapters, MarketplaceOptions};
use homeservices::outbound::gateway::LocalPaymentGateway;
use homeservices::outbound::memory::InMemoryMarketplace;

const SECRET: &str = "journey_secret";

fn state() -> HttpState {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    HttpState::from_adapters(
        MarketplaceAdapters {
            users: store.clone(),
            services: store.clone(),
            bookings: store.clone(),
            ratings: store.clone(),
            payments: store,
            gateway: Arc::new(LocalPaymentGateway::new()),
        },
        MarketplaceOptions {
            hasher: CredentialHasher::low_cost(),
            allow_admin_signup: false,
            assignment_policy: AssignmentPolicyKind::ServiceOwner,
            verifier: PaymentSignatureVerifier::new(SECRET),
            payment_key_id: "rzp_test_journey".to_owned(),
            clock: Arc::new(DefaultClock),
        },
    )
}

async fn call<S>(app: &S, req: test::TestRequest, cookie: &Cookie<'static>) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, req.cookie(cookie.clone()).to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

async fn login<S>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": DEMO_PASSWORD }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK, "login for {email}");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}

#[actix_web::test]
async fn customer_journey_keeps_journal_and_balance_in_step() {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state()))
            .service(web::scope("/api/v1").wrap(session).configure(configure_api)),
    )
    .await;

    let provider = login(&app, "provider@example.com").await;
    let customer = login(&app, "customer@example.com").await;

    let (status, listing) = call(
        &app,
        test::TestRequest::post().uri("/api/v1/provider/services").set_json(json!({
            "title": "Kitchen plumbing",
            "category": "Plumbing",
            "creditCost": 30
        })),
        &provider,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let service_id = listing["id"].as_str().expect("service id").to_owned();

    let (status, catalogue) = call(&app, test::TestRequest::get().uri("/api/v1/services"), &customer).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        catalogue
            .as_array()
            .expect("listing array")
            .iter()
            .any(|service| service["id"] == service_id.as_str())
    );

    let (status, created) = call(
        &app,
        test::TestRequest::post().uri("/api/v1/bookings").set_json(json!({
            "serviceId": service_id,
            "address": { "houseNumber": "4", "label": "Flat" },
            "phone": "9876543210"
        })),
        &customer,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["credits"], 70);
    assert_eq!(created["booking"]["status"], "ASSIGNED");
    let booking_id = created["booking"]["id"].as_str().expect("booking id").to_owned();

    let (status, inbox) = call(&app, test::TestRequest::get().uri("/api/v1/provider/bookings"), &provider).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox.as_array().map(Vec::len), Some(1));

    let (status, _) = call(
        &app,
        test::TestRequest::post().uri(&format!("/api/v1/provider/bookings/{booking_id}/accept")),
        &provider,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, completed) = call(
        &app,
        test::TestRequest::patch().uri(&format!("/api/v1/bookings/{booking_id}/complete")),
        &customer,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["booking"]["status"], "COMPLETED");
    assert_eq!(completed["events"].as_array().map(Vec::len), Some(4));

    let (status, receipt) = call(
        &app,
        test::TestRequest::post().uri("/api/v1/ratings").set_json(json!({
            "bookingId": booking_id,
            "rating": 5,
            "review": "Quick and tidy"
        })),
        &customer,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["ratingAvg"], 5.0);

    let (status, order) = call(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/payments/create-order")
            .set_json(json!({ "credits": 20 })),
        &customer,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["amount"], 2000);
    let order_id = order["orderId"].as_str().expect("order id").to_owned();
    let signature = PaymentSignatureVerifier::new(SECRET).sign(&order_id, "pay_journey");

    let (status, verified) = call(
        &app,
        test::TestRequest::post().uri("/api/v1/payments/verify").set_json(json!({
            "orderId": order_id,
            "paymentId": "pay_journey",
            "signature": signature
        })),
        &customer,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["credits"], 90);

    let (_, me) = call(&app, test::TestRequest::get().uri("/api/v1/me"), &customer).await;
    assert_eq!(me["credits"], 90);

    let (status, journal) = call(&app, test::TestRequest::get().uri("/api/v1/ledger"), &customer).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = journal
        .as_array()
        .expect("journal array")
        .iter()
        .filter_map(|entry| entry["kind"].as_str())
        .collect();
    assert_eq!(kinds, ["PAYMENT_CREDIT", "BOOKING_DEBIT", "PAYMENT_CREDIT"]);
    assert_eq!(journal[2]["balanceAfter"], 90);

    let (status, _) = call(&app, test::TestRequest::post().uri("/api/v1/logout"), &customer).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
