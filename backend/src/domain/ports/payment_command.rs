//! Driving port for buying credits.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Caller, CreditBalance, Error, Payment};

/// Order details the client needs to open the gateway checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub order_id: String,
    /// Charge in minor currency units.
    pub amount: u64,
    pub currency: String,
    /// Public gateway key id.
    pub key: String,
}

/// Gateway callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub balance: CreditBalance,
    /// `false` on a retried verification that granted nothing new.
    pub credited: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    /// Open a gateway order for `credits` credits.
    async fn create_order(&self, caller: &Caller, credits: i64) -> Result<PaymentOrder, Error>;

    /// Check the gateway signature and credit the purchaser once.
    async fn verify_payment(&self, caller: &Caller, request: VerifyPaymentRequest) -> Result<PaymentReceipt, Error>;
}
