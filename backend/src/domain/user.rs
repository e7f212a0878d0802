//! Marketplace accounts and the authenticated caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{CreditBalance, Error, UserId};

/// Account role. Fixed at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Provider,
    Admin,
}

impl Role {
    /// Stable storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Provider => "PROVIDER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored role string is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "PROVIDER" => Ok(Self::Provider),
            "ADMIN" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Marketplace account.
///
/// `credits` only changes through ledger postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    credits: CreditBalance,
}

impl User {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        credits: CreditBalance,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            credits,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn credits(&self) -> CreditBalance {
        self.credits
    }

    /// Copy of this account carrying a new balance.
    #[must_use]
    pub fn with_credits(mut self, credits: CreditBalance) -> Self {
        self.credits = credits;
        self
    }

    /// Identity and role as seen by request handlers.
    pub fn as_caller(&self) -> Caller {
        Caller::new(self.id, self.role)
    }
}

/// The authenticated principal performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    id: UserId,
    role: Role,
}

impl Caller {
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fail with `Forbidden` unless the caller holds `role`.
    ///
    /// # Examples
    /// ```
    /// use homeservices::domain::{Caller, ErrorCode, Role, UserId};
    ///
    /// let caller = Caller::new(UserId::random(), Role::Customer);
    /// assert!(caller.require(Role::Customer).is_ok());
    /// let err = caller.require(Role::Admin).expect_err("customers are not admins");
    /// assert_eq!(err.code(), ErrorCode::Forbidden);
    /// ```
    pub fn require(&self, role: Role) -> Result<(), Error> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "{} role required for this action",
                role.as_str().to_lowercase()
            )))
        }
    }
}
