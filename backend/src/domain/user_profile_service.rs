//! Profile and journal reads for the signed-in user.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, UserProfileQuery, UserRepository, UserRepositoryError,
};
use crate::domain::{Error, FailureReason, LedgerEntry, User, UserId};

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::EmailTaken { email } => {
            Error::conflict(format!("email {email} is already registered"))
                .with_reason(FailureReason::EmailTaken)
        }
    }
}

fn map_ledger_error(error: LedgerRepositoryError) -> Error {
    match error {
        LedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ledger repository unavailable: {message}"))
        }
        LedgerRepositoryError::Query { message } => {
            Error::internal(format!("ledger repository error: {message}"))
        }
    }
}

/// Implements [`UserProfileQuery`].
#[derive(Clone)]
pub struct UserProfileService<U, L> {
    users: Arc<U>,
    ledger: Arc<L>,
}

impl<U, L> UserProfileService<U, L> {
    pub fn new(users: Arc<U>, ledger: Arc<L>) -> Self {
        Self { users, ledger }
    }
}

#[async_trait]
impl<U, L> UserProfileQuery for UserProfileService<U, L>
where
    U: UserRepository,
    L: LedgerRepository,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))
    }

    async fn fetch_ledger(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, Error> {
        self.ledger
            .entries_for_user(user_id)
            .await
            .map_err(map_ledger_error)
    }
}
