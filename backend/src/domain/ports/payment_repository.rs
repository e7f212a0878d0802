//! Driven port for payments and the credit they grant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CreditBalance, Payment};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentRepositoryError {
        Connection { message: String } => "payment repository connection failed: {message}",
        Query { message: String } => "payment repository query failed: {message}",
        /// No payment for this gateway order.
        NotFound { order_id: String } => "payment for order {order_id} not found",
        /// The purchaser's account does not exist.
        UserNotFound { user_id: String } => "user {user_id} not found",
        /// Crediting would exceed the balance representation.
        BalanceOverflow { user_id: String } => "credit balance overflow for user {user_id}",
    }
}

/// Outcome of settling a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Payment after settlement (always SUCCESS).
    pub payment: Payment,
    /// Purchaser's balance after the call.
    pub balance: CreditBalance,
    /// `false` when the payment was already settled and nothing was credited.
    pub credited: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<(), PaymentRepositoryError>;

    /// Lock the payment for `order_id`; if it is not yet SUCCESS, credit the
    /// purchaser, journal the posting, and mark it SUCCESS with
    /// `external_payment_id`. Settling twice credits once.
    async fn settle(
        &self,
        order_id: &str,
        external_payment_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Settlement, PaymentRepositoryError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, PaymentRepositoryError>;
}

/// Fixture repository that knows no orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentRepository;

#[async_trait]
impl PaymentRepository for FixturePaymentRepository {
    async fn create(&self, _payment: &Payment) -> Result<(), PaymentRepositoryError> {
        Ok(())
    }

    async fn settle(
        &self,
        order_id: &str,
        _external_payment_id: &str,
        _at: DateTime<Utc>,
    ) -> Result<Settlement, PaymentRepositoryError> {
        Err(PaymentRepositoryError::not_found(order_id))
    }

    async fn find_by_order_id(&self, _order_id: &str) -> Result<Option<Payment>, PaymentRepositoryError> {
        Ok(None)
    }
}
