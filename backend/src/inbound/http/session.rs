//! Session helpers keeping handlers free of cookie plumbing.
//!
//! The cookie only stores the user id. Every request re-reads the account so
//! the caller's role comes from storage rather than from the client.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::ports::UserProfileQuery;
use crate::domain::{Caller, Error, User, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Newtype exposing domain-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the authenticated user's id in the session cookie.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop every session value and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// The user id in the cookie, if present and well formed.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match UserId::new(&raw) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Require a signed-in user or fail with `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Load the signed-in account.
    pub async fn require_user(&self, profiles: &dyn UserProfileQuery) -> Result<User, Error> {
        let user_id = self.require_user_id()?;
        profiles.fetch_profile(&user_id).await
    }

    /// Resolve the signed-in account as a [`Caller`] for role checks.
    pub async fn require_caller(&self, profiles: &dyn UserProfileQuery) -> Result<Caller, Error> {
        self.require_user(profiles).await.map(|user| user.as_caller())
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
