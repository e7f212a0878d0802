//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::json;

use super::configure_api;
use super::state::{HttpState, MarketplaceAdapters, MarketplaceOptions};
use crate::domain::ports::DEMO_PASSWORD;
use crate::domain::{AssignmentPolicyKind, CredentialHasher, PaymentSignatureVerifier};
use crate::outbound::gateway::LocalPaymentGateway;
use crate::outbound::memory::InMemoryMarketplace;

pub const TEST_PAYMENT_SECRET: &str = "test_secret";
pub const CUSTOMER_EMAIL: &str = "customer@example.com";
pub const PROVIDER_EMAIL: &str = "provider@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Session middleware with a fresh key and `Secure` disabled for plain HTTP.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by `res`.
///
/// # Panics
/// Panics when the response did not set a session cookie.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Real services over `store`, with a local gateway and admin signup off.
pub fn memory_state(store: &Arc<InMemoryMarketplace>) -> HttpState {
    memory_state_with_admin_signup(store, false)
}

pub fn memory_state_with_admin_signup(
    store: &Arc<InMemoryMarketplace>,
    allow_admin_signup: bool,
) -> HttpState {
    HttpState::from_adapters(
        MarketplaceAdapters {
            users: store.clone(),
            services: store.clone(),
            bookings: store.clone(),
            ratings: store.clone(),
            payments: store.clone(),
            gateway: Arc::new(LocalPaymentGateway::new()),
        },
        MarketplaceOptions {
            hasher: CredentialHasher::low_cost(),
            allow_admin_signup,
            assignment_policy: AssignmentPolicyKind::ServiceOwner,
            verifier: PaymentSignatureVerifier::new(TEST_PAYMENT_SECRET),
            payment_key_id: "rzp_test_key".to_owned(),
            clock: Arc::new(DefaultClock),
        },
    )
}

/// The `/api/v1` surface over `state`, behind a test session.
pub fn api_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .wrap(test_session_middleware())
            .configure(configure_api),
    )
}

/// Log in with [`DEMO_PASSWORD`] and return the session cookie.
///
/// # Panics
/// Panics when the login is refused.
pub async fn sign_in<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": DEMO_PASSWORD }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login for {email} refused: {}", res.status());
    session_cookie(&res)
}
