//! Local payment gateway adapter.
//!
//! Issues order references in the gateway's `order_<id>` shape without
//! calling out to a payment provider. Deployments that hand checkout to a
//! hosted gateway swap this adapter for an SDK-backed one; the signature
//! check on verification is unchanged either way.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ExternalOrder, OrderRequest, PaymentGateway, PaymentGatewayError};

/// Largest single order the local gateway accepts, in minor units.
const MAX_ORDER_MINOR: u64 = 100_000_000;

/// Gateway adapter that mints order ids locally.
#[derive(Debug, Clone, Default)]
pub struct LocalPaymentGateway;

impl LocalPaymentGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for LocalPaymentGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<ExternalOrder, PaymentGatewayError> {
        if request.amount_minor > MAX_ORDER_MINOR {
            return Err(PaymentGatewayError::rejected(format!(
                "amount {} exceeds the per-order limit",
                request.amount_minor
            )));
        }
        let order_id = format!("order_{}", Uuid::new_v4().simple());
        debug!(order_id = %order_id, receipt = %request.receipt, "local gateway order issued");
        Ok(ExternalOrder {
            order_id,
            amount_minor: request.amount_minor,
            currency: request.currency.clone(),
        })
    }
}
