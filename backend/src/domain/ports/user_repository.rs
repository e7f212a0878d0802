//! Driven port for marketplace accounts and their stored password hashes.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses this email.
        EmailTaken { email: String } => "email {email} is already registered",
    }
}

/// Account storage.
///
/// A balance is written here only when the account is created; every later
/// change is a ledger posting made by the booking and payment repositories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Lookup by normalised (lower-case) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Insert a new account with its password hash.
    ///
    /// A non-zero opening balance is journalled as a credit in the same
    /// write. Fails with [`UserRepositoryError::EmailTaken`] when the email
    /// is in use.
    async fn create(&self, user: &User, password_hash: &str) -> Result<(), UserRepositoryError>;

    /// Stored password hash, `None` for an unknown account.
    async fn password_hash(&self, id: &UserId) -> Result<Option<String>, UserRepositoryError>;
}

/// Fixture repository with no accounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn create(&self, _user: &User, _password_hash: &str) -> Result<(), UserRepositoryError> {
        Ok(())
    }

    async fn password_hash(&self, _id: &UserId) -> Result<Option<String>, UserRepositoryError> {
        Ok(None)
    }
}
