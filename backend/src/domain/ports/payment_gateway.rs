//! Driven port for the external payment gateway's order API.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The gateway could not be reached.
        Unavailable { message: String } => "payment gateway unavailable: {message}",
        /// The gateway refused the order.
        Rejected { message: String } => "payment gateway rejected order: {message}",
    }
}

/// Order to open with the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Charge in minor currency units.
    pub amount_minor: u64,
    pub currency: String,
    /// Merchant-side receipt reference.
    pub receipt: String,
}

/// Order reference issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOrder {
    pub order_id: String,
    pub amount_minor: u64,
    pub currency: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<ExternalOrder, PaymentGatewayError>;
}

/// Gateway that echoes the receipt as the order id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<ExternalOrder, PaymentGatewayError> {
        Ok(ExternalOrder {
            order_id: format!("order_{}", request.receipt),
            amount_minor: request.amount_minor,
            currency: request.currency.clone(),
        })
    }
}
