//! Account endpoints.
//!
//! ```text
//! POST /api/v1/signup {"name":"Neha","email":"neha@example.com","password":"s3cret","role":"PROVIDER"}
//! POST /api/v1/login {"email":"customer@example.com","password":"password"}
//! GET /api/v1/me
//! GET /api/v1/ledger
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::SignupRequest;
use crate::domain::{Error, LedgerEntry, LoginCredentials, LoginValidationError, Role, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "customer@example.com")]
    pub email: String,
    #[schema(example = "password")]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyEmail => ("email", "empty_email"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Account role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleBody {
    Customer,
    Provider,
    Admin,
}

impl From<RoleBody> for Role {
    fn from(role: RoleBody) -> Self {
        match role {
            RoleBody::Customer => Self::Customer,
            RoleBody::Provider => Self::Provider,
            RoleBody::Admin => Self::Admin,
        }
    }
}

impl From<Role> for RoleBody {
    fn from(role: Role) -> Self {
        match role {
            Role::Customer => Self::Customer,
            Role::Provider => Self::Provider,
            Role::Admin => Self::Admin,
        }
    }
}

/// Signup request body. `role` defaults to `CUSTOMER`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    #[schema(example = "Neha Sharma")]
    pub name: String,
    #[schema(example = "neha@example.com")]
    pub email: String,
    #[schema(example = "s3cret")]
    pub password: String,
    #[serde(default)]
    pub role: Option<RoleBody>,
}

impl TryFrom<SignupBody> for SignupRequest {
    type Error = Error;

    fn try_from(value: SignupBody) -> Result<Self, Self::Error> {
        let credentials = LoginCredentials::try_from_parts(&value.email, &value.password)
            .map_err(map_login_validation_error)?;
        Ok(Self {
            name: value.name,
            credentials,
            role: value.role.map_or(Role::Customer, Role::from),
        })
    }
}

/// The signed-in account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Asha Customer")]
    pub name: String,
    #[schema(example = "customer@example.com")]
    pub email: String,
    pub role: RoleBody,
    /// Spendable credit balance.
    #[schema(example = 100)]
    pub credits: u64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            role: user.role().into(),
            credits: user.credits().value(),
        }
    }
}

/// One journal row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    /// `BOOKING_DEBIT` or `PAYMENT_CREDIT`.
    #[schema(example = "BOOKING_DEBIT")]
    pub kind: String,
    pub amount: u64,
    pub balance_after: u64,
    /// Booking id for debits, order id for credits.
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl From<&LedgerEntry> for LedgerEntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id(),
            kind: entry.kind().as_str().to_owned(),
            amount: entry.amount().value(),
            balance_after: entry.balance_after().value(),
            reference: entry.reference().to_owned(),
            created_at: entry.created_at(),
        }
    }
}

/// Register an account. Does not sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupBody,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Role not allowed", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupBody>,
) -> ApiResult<HttpResponse> {
    let request = SignupRequest::try_from(payload.into_inner())?;
    let user = state.signup.sign_up(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    let user = state.profile.fetch_profile(&user_id).await?;
    session.persist_user(&user_id)?;
    info!(user_id = %user_id, role = %user.role(), "user signed in");
    Ok(web::Json(UserResponse::from(&user)))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// The signed-in account with its current balance.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user = session.require_user(state.profile.as_ref()).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// The signed-in account's credit journal, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/ledger",
    responses(
        (status = 200, description = "Journal entries", body = [LedgerEntryResponse]),
        (status = 401, description = "Login required", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "ledger"
)]
#[get("/ledger")]
pub async fn ledger(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<LedgerEntryResponse>>> {
    let user_id = session.require_user_id()?;
    let entries = state.profile.fetch_ledger(&user_id).await?;
    Ok(web::Json(entries.iter().map(LedgerEntryResponse::from).collect()))
}

#[cfg(test)]
#[path = "users/tests.rs"]
mod tests;
