//! Signup, login, profile, and journal endpoints over the in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::inbound::http::test_utils::{
    CUSTOMER_EMAIL, api_app, memory_state, memory_state_with_admin_signup, session_cookie, sign_in,
};
use crate::outbound::memory::InMemoryMarketplace;

fn store() -> Arc<InMemoryMarketplace> {
    Arc::new(InMemoryMarketplace::with_demo_accounts())
}

fn signup_request(body: Value) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/v1/signup")
        .set_json(body)
        .to_request()
}

#[rstest]
#[case(json!("CUSTOMER"), RoleBody::Customer)]
#[case(json!("PROVIDER"), RoleBody::Provider)]
#[case(Value::Null, RoleBody::Customer)]
#[actix_rt::test]
async fn signup_creates_an_empty_account(#[case] role: Value, #[case] expected: RoleBody) {
    let store = store();
    let app = test::init_service(api_app(memory_state(&store))).await;
    let res = test::call_service(
        &app,
        signup_request(json!({
            "name": "Neha Sharma",
            "email": "Neha@Example.com",
            "password": "s3cret",
            "role": role,
        })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(res.response().cookies().next().is_none(), "signup must not sign in");
    let body: UserResponse = test::read_body_json(res).await;
    assert_eq!(body.email, "neha@example.com");
    assert_eq!(body.role, expected);
    assert_eq!(body.credits, 0);

    let stored = store
        .user(&crate::domain::UserId::from_uuid(body.id))
        .expect("account stored");
    assert_eq!(stored.credits().value(), 0);
}

#[actix_web::test]
async fn signed_up_account_can_log_in() {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let created = test::call_service(
        &app,
        signup_request(json!({
            "name": "Ravi",
            "email": "ravi@example.com",
            "password": "tr0ub4dor",
            "role": "PROVIDER",
        })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let wrong = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "ravi@example.com", "password": "password" }))
            .to_request(),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "RAVI@example.com", "password": "tr0ub4dor" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);
    let me = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/me").cookie(cookie).to_request(),
    )
    .await;
    let body: UserResponse = test::read_body_json(me).await;
    assert_eq!(body.role, RoleBody::Provider);
    assert_eq!(body.credits, 0);
}

#[rstest]
#[case(false, StatusCode::FORBIDDEN)]
#[case(true, StatusCode::CREATED)]
#[actix_rt::test]
async fn admin_signup_needs_the_setting(#[case] allowed: bool, #[case] expected: StatusCode) {
    let state = memory_state_with_admin_signup(&store(), allowed);
    let app = test::init_service(api_app(state)).await;
    let res = test::call_service(
        &app,
        signup_request(json!({
            "name": "Root",
            "email": "root@example.com",
            "password": "s3cret",
            "role": "ADMIN",
        })),
    )
    .await;
    assert_eq!(res.status(), expected);
    if !allowed {
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["code"], "role_not_allowed");
    }
}

#[actix_web::test]
async fn duplicate_email_is_a_conflict() {
    let store = store();
    let app = test::init_service(api_app(memory_state(&store))).await;
    let res = test::call_service(
        &app,
        signup_request(json!({
            "name": "Impostor",
            "email": "CUSTOMER@example.com",
            "password": "s3cret",
        })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], "email_taken");

    let existing = sign_in(&app, CUSTOMER_EMAIL).await;
    let me = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/me").cookie(existing).to_request(),
    )
    .await;
    let body: UserResponse = test::read_body_json(me).await;
    assert_eq!(body.credits, 100);
}

#[rstest]
#[case(json!({ "name": "  ", "email": "a@example.com", "password": "pw" }), "name")]
#[case(json!({ "name": "A", "email": "", "password": "pw" }), "email")]
#[case(json!({ "name": "A", "email": "a@example.com", "password": "" }), "password")]
#[actix_rt::test]
async fn blank_signup_fields_are_rejected(#[case] body: Value, #[case] field: &str) {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let res = test::call_service(&app, signup_request(body)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[case("   ", "password", "email", "empty_email")]
#[case("customer@example.com", "", "password", "empty_password")]
#[actix_rt::test]
async fn blank_login_fields_are_rejected(
    #[case] email: &str,
    #[case] password: &str,
    #[case] field: &str,
    #[case] code: &str,
) {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": CUSTOMER_EMAIL, "password": "guess" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn me_reports_role_and_credits() {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let cookie = sign_in(&app, CUSTOMER_EMAIL).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/me").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: UserResponse = test::read_body_json(res).await;
    assert_eq!(body.email, CUSTOMER_EMAIL);
    assert_eq!(body.role, RoleBody::Customer);
    assert_eq!(body.credits, 100);
}

#[actix_web::test]
async fn me_without_session_is_unauthorized() {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/api/v1/me").to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn ledger_starts_with_opening_balance() {
    let app = test::init_service(api_app(memory_state(&store()))).await;
    let cookie = sign_in(&app, CUSTOMER_EMAIL).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/ledger").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let entries: Vec<LedgerEntryResponse> = test::read_body_json(res).await;
    assert_eq!(entries.len(), 1);
    let opening = entries.first().expect("opening entry");
    assert_eq!(opening.kind, "PAYMENT_CREDIT");
    assert_eq!(opening.balance_after, 100);
}
