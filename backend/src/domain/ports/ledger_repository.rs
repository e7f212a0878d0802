//! Driven port for reading the credit journal.

use async_trait::async_trait;

use crate::domain::{LedgerEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger repository adapters.
    pub enum LedgerRepositoryError {
        Connection { message: String } => "ledger repository connection failed: {message}",
        Query { message: String } => "ledger repository query failed: {message}",
    }
}

/// Read side of the journal. Entries are written by the booking and payment
/// repositories inside their own transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// A user's postings, oldest first.
    async fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, LedgerRepositoryError>;
}

/// Fixture with an empty journal.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLedgerRepository;

#[async_trait]
impl LedgerRepository for FixtureLedgerRepository {
    async fn entries_for_user(&self, _user_id: &UserId) -> Result<Vec<LedgerEntry>, LedgerRepositoryError> {
        Ok(Vec::new())
    }
}
