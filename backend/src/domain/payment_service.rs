//! Payment reconciler service.
//!
//! Opening an order records a CREATED payment against a gateway order.
//! Verification checks the gateway signature before touching storage, so a
//! mismatch leaves the payment CREATED and the call can be retried. Only the
//! customer who opened an order may settle it.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    OrderRequest, PaymentCommand, PaymentGateway, PaymentGatewayError, PaymentOrder,
    PaymentReceipt, PaymentRepository, PaymentRepositoryError, VerifyPaymentRequest,
};
use crate::domain::{
    Caller, CreditAmount, Error, FailureReason, ORDER_CURRENCY, Payment,
    PaymentSignatureVerifier, Role, order_amount_minor,
};

fn map_payment_repository_error(error: PaymentRepositoryError) -> Error {
    match error {
        PaymentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            Error::internal(format!("payment repository error: {message}"))
        }
        PaymentRepositoryError::NotFound { order_id } => {
            Error::not_found(format!("payment for order {order_id} not found"))
        }
        PaymentRepositoryError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        PaymentRepositoryError::BalanceOverflow { user_id } => {
            Error::internal(format!("credit balance overflow for user {user_id}"))
        }
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::Unavailable { message } => {
            Error::service_unavailable(format!("payment gateway unavailable: {message}"))
        }
        PaymentGatewayError::Rejected { message } => {
            Error::invalid_request(format!("payment gateway rejected order: {message}"))
        }
    }
}

fn invalid_amount(credits: i64) -> Error {
    Error::invalid_request("credits must be a positive integer")
        .with_details(json!({ "field": "credits", "value": credits }))
        .with_reason(FailureReason::InvalidAmount)
}

/// Payment service implementing [`PaymentCommand`].
#[derive(Clone)]
pub struct PaymentService<P, G> {
    payments: Arc<P>,
    gateway: Arc<G>,
    verifier: PaymentSignatureVerifier,
    key_id: String,
    clock: Arc<dyn Clock>,
}

impl<P, G> PaymentService<P, G> {
    /// `key_id` is the public gateway key echoed to clients.
    pub fn new(
        payments: Arc<P>,
        gateway: Arc<G>,
        verifier: PaymentSignatureVerifier,
        key_id: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payments,
            gateway,
            verifier,
            key_id: key_id.into(),
            clock,
        }
    }
}

#[async_trait]
impl<P, G> PaymentCommand for PaymentService<P, G>
where
    P: PaymentRepository,
    G: PaymentGateway,
{
    async fn create_order(&self, caller: &Caller, credits: i64) -> Result<PaymentOrder, Error> {
        caller.require(Role::Customer)?;
        let amount = CreditAmount::from_signed(credits).map_err(|_| invalid_amount(credits))?;
        let amount_minor = order_amount_minor(amount).ok_or_else(|| invalid_amount(credits))?;

        let now = self.clock.utc();
        let order = self
            .gateway
            .create_order(&OrderRequest {
                amount_minor,
                currency: ORDER_CURRENCY.to_owned(),
                receipt: format!("credits_{}", now.timestamp_millis()),
            })
            .await
            .map_err(map_gateway_error)?;

        let payment = Payment::created(*caller.id(), order.order_id.clone(), amount, now);
        self.payments
            .create(&payment)
            .await
            .map_err(map_payment_repository_error)?;

        info!(
            user_id = %caller.id(),
            order_id = %order.order_id,
            credits = amount.value(),
            "payment order created"
        );
        Ok(PaymentOrder {
            order_id: order.order_id,
            amount: order.amount_minor,
            currency: order.currency,
            key: self.key_id.clone(),
        })
    }

    async fn verify_payment(&self, caller: &Caller, request: VerifyPaymentRequest) -> Result<PaymentReceipt, Error> {
        caller.require(Role::Customer)?;
        let VerifyPaymentRequest {
            order_id,
            payment_id,
            signature,
        } = request;

        if self.verifier.verify(&order_id, &payment_id, &signature).is_err() {
            warn!(user_id = %caller.id(), order_id = %order_id, "payment signature mismatch");
            return Err(Error::invalid_request("payment signature verification failed")
                .with_reason(FailureReason::SignatureMismatch));
        }

        let payment = self
            .payments
            .find_by_order_id(&order_id)
            .await
            .map_err(map_payment_repository_error)?
            .ok_or_else(|| Error::not_found(format!("payment for order {order_id} not found")))?;
        if payment.user_id() != caller.id() {
            warn!(user_id = %caller.id(), order_id = %order_id, "payment verification by non-owner");
            return Err(Error::forbidden("payment belongs to another user")
                .with_reason(FailureReason::NotOwner));
        }

        let settlement = self
            .payments
            .settle(&order_id, &payment_id, self.clock.utc())
            .await
            .map_err(map_payment_repository_error)?;

        if settlement.credited {
            info!(
                user_id = %settlement.payment.user_id(),
                order_id = %order_id,
                credits = settlement.payment.credits_added().value(),
                balance = settlement.balance.value(),
                "payment verified and credited"
            );
        } else {
            info!(order_id = %order_id, "payment already settled; no credit granted");
        }
        Ok(PaymentReceipt {
            payment: settlement.payment,
            balance: settlement.balance,
            credited: settlement.credited,
        })
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;
