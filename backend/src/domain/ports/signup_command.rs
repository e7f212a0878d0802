//! Driving port for account signup.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, Role, User};

/// Self-service registration fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub name: String,
    pub credentials: LoginCredentials,
    pub role: Role,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignupCommand: Send + Sync {
    /// Create an account with a zero balance.
    ///
    /// Admin signup is refused unless the deployment enables it; a second
    /// account for the same email is a conflict.
    async fn sign_up(&self, request: SignupRequest) -> Result<User, Error>;
}
