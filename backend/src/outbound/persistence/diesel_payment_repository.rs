//! PostgreSQL-backed [`PaymentRepository`].
//!
//! Settlement locks the payment row, then the purchaser's row, so a retried
//! verification waits for the first one and then sees SUCCESS instead of
//! crediting again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{PaymentRepository, PaymentRepositoryError, Settlement};
use crate::domain::{CreditBalance, Ledger, LedgerError, Payment, PaymentStatus};

use super::diesel_error_mapping::{TxError, is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewLedgerEntryRow, NewPaymentRow, PaymentRow};
use super::pool::DbPool;
use super::schema::{ledger_entries, payments, users};

/// Diesel adapter over `payments` and the payment credit.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn payment_error(error: diesel::result::Error) -> PaymentRepositoryError {
    map_diesel_error(error, PaymentRepositoryError::query, PaymentRepositoryError::connection)
}

fn refused(error: PaymentRepositoryError) -> TxError<PaymentRepositoryError> {
    TxError::Refused(error)
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PaymentRepositoryError> {
    Payment::try_from(row).map_err(|err| PaymentRepositoryError::query(err.to_string()))
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let credits_added = payment
            .credits_added()
            .to_stored()
            .map_err(|err| PaymentRepositoryError::query(err.to_string()))?;
        let row = NewPaymentRow {
            id: payment.id(),
            user_id: *payment.user_id().as_uuid(),
            order_id: payment.order_id(),
            external_payment_id: payment.external_payment_id(),
            credits_added,
            status: payment.status().as_str(),
            created_at: payment.created_at(),
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;
        diesel::insert_into(payments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    PaymentRepositoryError::query(format!("order {} already recorded", payment.order_id()))
                } else {
                    payment_error(err)
                }
            })?;
        Ok(())
    }

    async fn settle(
        &self,
        order_id: &str,
        external_payment_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Settlement, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;

        let settled: Result<Settlement, TxError<PaymentRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let row = payments::table
                        .filter(payments::order_id.eq(order_id))
                        .select(PaymentRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| refused(PaymentRepositoryError::not_found(order_id)))?;
                    let payment = row_to_payment(row).map_err(refused)?;
                    let user_id = *payment.user_id().as_uuid();

                    let stored = users::table
                        .find(user_id)
                        .select(users::credits)
                        .for_update()
                        .first::<i64>(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| {
                            refused(PaymentRepositoryError::user_not_found(payment.user_id().to_string()))
                        })?;
                    let balance = CreditBalance::try_from_stored(stored)
                        .map_err(|err| refused(PaymentRepositoryError::query(err.to_string())))?;

                    if payment.is_settled() {
                        debug!(order_id, "payment already settled");
                        return Ok(Settlement {
                            payment,
                            balance,
                            credited: false,
                        });
                    }

                    let overflow = || refused(PaymentRepositoryError::balance_overflow(payment.user_id().to_string()));
                    let posting = Ledger::credit(payment.user_id(), balance, payment.credits_added(), order_id, at)
                        .map_err(|err| match err {
                            LedgerError::Overflow => overflow(),
                            other => refused(PaymentRepositoryError::query(other.to_string())),
                        })?;
                    let next = posting.balance.to_stored().map_err(|_| overflow())?;
                    let entry = NewLedgerEntryRow::try_from(&posting.entry).map_err(|_| overflow())?;

                    diesel::update(users::table.find(user_id))
                        .set(users::credits.eq(next))
                        .execute(conn)
                        .await?;
                    diesel::insert_into(ledger_entries::table)
                        .values(&entry)
                        .execute(conn)
                        .await?;
                    diesel::update(payments::table.find(payment.id()))
                        .set((
                            payments::status.eq(PaymentStatus::Success.as_str()),
                            payments::external_payment_id.eq(Some(external_payment_id)),
                        ))
                        .execute(conn)
                        .await?;

                    Ok(Settlement {
                        payment: payment.settle(external_payment_id),
                        balance: posting.balance,
                        credited: true,
                    })
                }
                .scope_boxed()
            })
            .await;
        settled.map_err(|err| err.into_port_error(payment_error))
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, PaymentRepositoryError::connection))?;
        let row = payments::table
            .filter(payments::order_id.eq(order_id))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(payment_error)?;
        row.map(row_to_payment).transpose()
    }
}
