//! Driving port for the caller's own account.

use async_trait::async_trait;

use crate::domain::{Error, LedgerEntry, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileQuery: Send + Sync {
    /// Account and current balance. Missing accounts are `Unauthorized`
    /// since the id comes from a session.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Credit journal, oldest first.
    async fn fetch_ledger(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, Error>;
}
