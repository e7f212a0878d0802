//! Driving port for login, and the demo accounts seeded for local use.
//!
//! Handlers only need a user id back for the session cookie.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, Role, UserId};

#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}

/// Password shared by the demo accounts.
pub const DEMO_PASSWORD: &str = "password";

/// An account seeded with [`DEMO_PASSWORD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoAccount {
    pub id: &'static str,
    pub name: &'static str,
    pub email: &'static str,
    pub role: Role,
    pub credits: u64,
}

/// Accounts seeded by the in-memory store and by debug builds on an empty
/// database.
pub const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        id: "11111111-1111-4111-8111-111111111111",
        name: "Asha Customer",
        email: "customer@example.com",
        role: Role::Customer,
        credits: 100,
    },
    DemoAccount {
        id: "22222222-2222-4222-8222-222222222222",
        name: "Ravi Provider",
        email: "provider@example.com",
        role: Role::Provider,
        credits: 0,
    },
    DemoAccount {
        id: "33333333-3333-4333-8333-333333333333",
        name: "Meera Admin",
        email: "admin@example.com",
        role: Role::Admin,
        credits: 0,
    },
];
