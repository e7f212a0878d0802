//! PostgreSQL-backed accounts: [`UserRepository`], the provider pool behind
//! [`ProviderDirectory`], and the credit journal read by
//! [`LedgerRepository`].
//!
//! Account creation inserts the user and its opening journal entry in one
//! transaction; the `users.email` unique index decides concurrent signups.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, ProviderDirectory, ProviderDirectoryError,
    UserRepository, UserRepositoryError,
};
use crate::domain::{Ledger, LedgerEntry, Role, User, UserId};

use super::diesel_error_mapping::{TxError, is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{LedgerEntryRow, NewLedgerEntryRow, NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::{ledger_entries, users};

/// Diesel adapter over the `users` and `ledger_entries` tables.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(error, UserRepositoryError::query, UserRepositoryError::connection)
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    User::try_from(row).map_err(|err| {
        warn!(error = %err, "stored user failed validation");
        UserRepositoryError::query(err.to_string())
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserRepositoryError::connection))?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(user_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserRepositoryError::connection))?;
        let row = users::table
            .filter(users::email.eq(email.trim().to_lowercase()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(user_error)?;
        row.map(row_to_user).transpose()
    }

    async fn create(&self, user: &User, password_hash: &str) -> Result<(), UserRepositoryError> {
        let invalid = |err: crate::domain::LedgerError| UserRepositoryError::query(err.to_string());
        let opening = Ledger::opening(user.id(), user.credits(), Utc::now()).map_err(invalid)?;
        let entry = opening
            .as_ref()
            .map(|posting| NewLedgerEntryRow::try_from(&posting.entry))
            .transpose()
            .map_err(invalid)?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            name: user.name(),
            email: user.email(),
            role: user.role().as_str(),
            credits: user.credits().to_stored().map_err(invalid)?,
            password_hash,
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserRepositoryError::connection))?;

        let (row, entry) = (&row, entry.as_ref());
        let created: Result<(), TxError<UserRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(users::table)
                        .values(row)
                        .execute(conn)
                        .await?;
                    if let Some(entry) = entry {
                        diesel::insert_into(ledger_entries::table)
                            .values(entry)
                            .execute(conn)
                            .await?;
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        created.map_err(|err| {
            err.into_port_error(|err| {
                if is_unique_violation(&err) {
                    UserRepositoryError::email_taken(user.email())
                } else {
                    user_error(err)
                }
            })
        })
    }

    async fn password_hash(&self, id: &UserId) -> Result<Option<String>, UserRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserRepositoryError::connection))?;
        users::table
            .find(*id.as_uuid())
            .select(users::password_hash)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(user_error)
    }
}

#[async_trait]
impl ProviderDirectory for DieselUserRepository {
    async fn first_available_provider(&self) -> Result<Option<UserId>, ProviderDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ProviderDirectoryError::connection))?;
        let id = users::table
            .filter(users::role.eq(Role::Provider.as_str()))
            .order(users::seq.asc())
            .select(users::id)
            .first::<uuid::Uuid>(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(err, ProviderDirectoryError::query, ProviderDirectoryError::connection)
            })?;
        Ok(id.map(UserId::from_uuid))
    }
}

#[async_trait]
impl LedgerRepository for DieselUserRepository {
    async fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, LedgerRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LedgerRepositoryError::connection))?;
        let rows = ledger_entries::table
            .filter(ledger_entries::user_id.eq(*user_id.as_uuid()))
            .order(ledger_entries::seq.asc())
            .select(LedgerEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(err, LedgerRepositoryError::query, LedgerRepositoryError::connection)
            })?;
        rows.into_iter()
            .map(|row| LedgerEntry::try_from(row).map_err(|err| LedgerRepositoryError::query(err.to_string())))
            .collect()
    }
}
