//! Credit purchase endpoints.
//!
//! ```text
//! POST /api/v1/payments/create-order {"credits":50}
//! POST /api/v1/payments/verify {"orderId":"order_…","paymentId":"pay_…","signature":"…"}
//! ```
//!
//! Verification is idempotent per order: a retried callback returns the
//! settled payment with `credited: false`.

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Payment;
use crate::domain::ports::{PaymentOrder, VerifyPaymentRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Credits to buy.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderBody {
    #[schema(example = 50)]
    pub credits: i64,
}

/// Gateway order the client opens checkout with.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[schema(example = "order_9f1c2d")]
    pub order_id: String,
    /// Charge in minor currency units.
    #[schema(example = 5000)]
    pub amount: u64,
    #[schema(example = "INR")]
    pub currency: String,
    /// Public gateway key id.
    pub key: String,
}

impl From<PaymentOrder> for OrderResponse {
    fn from(order: PaymentOrder) -> Self {
        Self {
            order_id: order.order_id,
            amount: order.amount,
            currency: order.currency,
            key: order.key,
        }
    }
}

/// Gateway checkout callback.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentBody {
    pub order_id: String,
    pub payment_id: String,
    /// Hex HMAC-SHA256 of `order_id|payment_id`.
    pub signature: String,
}

impl From<VerifyPaymentBody> for VerifyPaymentRequest {
    fn from(body: VerifyPaymentBody) -> Self {
        Self {
            order_id: body.order_id,
            payment_id: body.payment_id,
            signature: body.signature,
        }
    }
}

/// A payment record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub credits_added: u64,
    /// `CREATED` or `SUCCESS`.
    #[schema(example = "SUCCESS")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id(),
            order_id: payment.order_id().to_owned(),
            payment_id: payment.external_payment_id().map(str::to_owned),
            credits_added: payment.credits_added().value(),
            status: payment.status().as_str().to_owned(),
            created_at: payment.created_at(),
        }
    }
}

/// Verification outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub payment: PaymentResponse,
    /// Balance after settlement.
    pub credits: u64,
    /// `false` when the order had already been settled.
    pub credited: bool,
}

/// Open a gateway order for a credit purchase. Customer only.
#[utoipa::path(
    post,
    path = "/api/v1/payments/create-order",
    request_body = CreateOrderBody,
    responses(
        (status = 200, description = "Order opened", body = OrderResponse),
        (status = 400, description = "Credits not a positive integer", body = ErrorSchema),
        (status = 403, description = "Customer role required", body = ErrorSchema),
        (status = 503, description = "Gateway unavailable", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "createOrder"
)]
#[post("/payments/create-order")]
pub async fn create_order(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateOrderBody>,
) -> ApiResult<web::Json<OrderResponse>> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let order = state
        .payments
        .create_order(&caller, payload.into_inner().credits)
        .await?;
    Ok(web::Json(order.into()))
}

/// Check the gateway signature and grant the purchased credits.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentBody,
    responses(
        (status = 200, description = "Payment settled", body = VerifyPaymentResponse),
        (status = 400, description = "Signature mismatch", body = ErrorSchema),
        (status = 404, description = "Unknown order", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "verifyPayment"
)]
#[post("/payments/verify")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VerifyPaymentBody>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_caller(state.profile.as_ref()).await?;
    let receipt = state
        .payments
        .verify_payment(&caller, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse {
        payment: PaymentResponse::from(&receipt.payment),
        credits: receipt.balance.value(),
        credited: receipt.credited,
    }))
}
