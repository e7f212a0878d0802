//! Provider assignment policies.
//!
//! The booking service holds exactly one policy, chosen at construction.
//! [`ServiceOwnerPolicy`] is the default; [`FirstAvailableProviderPolicy`]
//! assigns every booking to the earliest-registered provider.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ports::{ProviderDirectory, ProviderDirectoryError};
use super::{Service, UserId};

/// Why no provider could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    /// No owner and no provider in the pool.
    #[error("no provider available for service {service_id}")]
    NoProviderAvailable { service_id: String },
    /// The provider directory failed.
    #[error(transparent)]
    Directory(#[from] ProviderDirectoryError),
}

/// Strategy resolving the provider a new booking is assigned to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentPolicy: Send + Sync {
    async fn resolve_provider(&self, service: &Service) -> Result<UserId, AssignmentError>;
}

/// Configuration name of a policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentPolicyKind {
    #[default]
    ServiceOwner,
    FirstAvailable,
}

impl AssignmentPolicyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceOwner => "service-owner",
            Self::FirstAvailable => "first-available",
        }
    }

    /// Build the configured policy over `directory`.
    pub fn build<D>(self, directory: Arc<D>) -> Arc<dyn AssignmentPolicy>
    where
        D: ProviderDirectory + 'static,
    {
        match self {
            Self::ServiceOwner => Arc::new(ServiceOwnerPolicy::new(directory)),
            Self::FirstAvailable => Arc::new(FirstAvailableProviderPolicy::new(directory)),
        }
    }
}

impl fmt::Display for AssignmentPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "service-owner" => Ok(Self::ServiceOwner),
            "first-available" => Ok(Self::FirstAvailable),
            other => Err(format!(
                "unknown assignment policy {other:?}; expected service-owner or first-available"
            )),
        }
    }
}

/// Assign to the service's owner; unowned services fall back to the
/// earliest-registered provider.
#[derive(Clone)]
pub struct ServiceOwnerPolicy<D> {
    directory: Arc<D>,
}

impl<D> ServiceOwnerPolicy<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D> AssignmentPolicy for ServiceOwnerPolicy<D>
where
    D: ProviderDirectory,
{
    async fn resolve_provider(&self, service: &Service) -> Result<UserId, AssignmentError> {
        if let Some(owner) = service.provider_id() {
            return Ok(*owner);
        }
        debug!(service_id = %service.id(), "service has no owner; using provider pool");
        first_in_pool(self.directory.as_ref(), service).await
    }
}

/// Assign every booking to the earliest-registered provider.
#[derive(Clone)]
pub struct FirstAvailableProviderPolicy<D> {
    directory: Arc<D>,
}

impl<D> FirstAvailableProviderPolicy<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D> AssignmentPolicy for FirstAvailableProviderPolicy<D>
where
    D: ProviderDirectory,
{
    async fn resolve_provider(&self, service: &Service) -> Result<UserId, AssignmentError> {
        first_in_pool(self.directory.as_ref(), service).await
    }
}

async fn first_in_pool<D>(directory: &D, service: &Service) -> Result<UserId, AssignmentError>
where
    D: ProviderDirectory + ?Sized,
{
    directory
        .first_available_provider()
        .await?
        .ok_or_else(|| AssignmentError::NoProviderAvailable {
            service_id: service.id().to_string(),
        })
}
