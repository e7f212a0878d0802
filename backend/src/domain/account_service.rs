//! Account service: repository-backed login and self-service signup.
//!
//! Passwords are checked against the Argon2id hash stored with the account.
//! An unknown email and a wrong password produce the same `Unauthorized`
//! error. Signup opens accounts with a zero balance; credits arrive only
//! through verified payments.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    DEMO_ACCOUNTS, DEMO_PASSWORD, LoginService, SignupCommand, SignupRequest, UserRepository,
    UserRepositoryError,
};
use crate::domain::user_profile_service::map_user_error;
use crate::domain::{
    CredentialHasher, CreditBalance, Error, FailureReason, LoginCredentials, Role, User, UserId,
};

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

/// Implements [`LoginService`] and [`SignupCommand`] over a [`UserRepository`].
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    hasher: CredentialHasher,
    allow_admin_signup: bool,
}

impl<U> AccountService<U> {
    pub fn new(users: Arc<U>, hasher: CredentialHasher) -> Self {
        Self {
            users,
            hasher,
            allow_admin_signup: false,
        }
    }

    /// Permit `ADMIN` as a signup role.
    #[must_use]
    pub fn allow_admin_signup(mut self, allow: bool) -> Self {
        self.allow_admin_signup = allow;
        self
    }

    fn role_allowed(&self, role: Role) -> bool {
        match role {
            Role::Customer | Role::Provider => true,
            Role::Admin => self.allow_admin_signup,
        }
    }
}

impl<U> AccountService<U>
where
    U: UserRepository,
{
    /// Create whichever demo accounts are missing, with their opening
    /// balances. Returns how many were created.
    pub async fn ensure_demo_accounts(&self) -> Result<usize, Error> {
        let mut created = 0;
        for account in DEMO_ACCOUNTS {
            let existing = self
                .users
                .find_by_email(account.email)
                .await
                .map_err(map_user_error)?;
            if existing.is_some() {
                continue;
            }
            let id = UserId::new(account.id)
                .map_err(|err| Error::internal(format!("invalid demo account id: {err}")))?;
            let user = User::new(
                id,
                account.name,
                account.email,
                account.role,
                CreditBalance::new(account.credits),
            );
            let hash = self.hasher.hash(DEMO_PASSWORD)?;
            match self.users.create(&user, &hash).await {
                Ok(()) => created += 1,
                Err(UserRepositoryError::EmailTaken { .. }) => {}
                Err(err) => return Err(map_user_error(err)),
            }
        }
        Ok(created)
    }
}

#[async_trait]
impl<U> LoginService for AccountService<U>
where
    U: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid_credentials)?;
        let stored = self
            .users
            .password_hash(user.id())
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid_credentials)?;
        if !self.hasher.verify(credentials.password(), &stored) {
            warn!(user_id = %user.id(), "login refused: wrong password");
            return Err(invalid_credentials());
        }
        Ok(*user.id())
    }
}

#[async_trait]
impl<U> SignupCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn sign_up(&self, request: SignupRequest) -> Result<User, Error> {
        let SignupRequest {
            name,
            credentials,
            role,
        } = request;
        if !self.role_allowed(role) {
            return Err(Error::forbidden(format!("role {role} cannot sign up"))
                .with_reason(FailureReason::RoleNotAllowed));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_request("name must not be empty")
                .with_details(json!({ "field": "name" })));
        }

        let taken = || {
            Error::conflict(format!("email {} is already registered", credentials.email()))
                .with_reason(FailureReason::EmailTaken)
        };
        if self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(taken());
        }

        let user = User::new(
            UserId::random(),
            name,
            credentials.email(),
            role,
            CreditBalance::new(0),
        );
        let hash = self.hasher.hash(credentials.password())?;
        self.users
            .create(&user, &hash)
            .await
            .map_err(|err| match err {
                UserRepositoryError::EmailTaken { .. } => taken(),
                other => map_user_error(other),
            })?;
        info!(user_id = %user.id(), role = %role, "account created");
        Ok(user)
    }
}
