//! Bookable service listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CreditAmount, RatingAverage, ServiceId, UserId};

/// Raised when a listing draft is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("category must not be empty")]
    EmptyCategory,
    #[error("credit cost must be a positive integer")]
    InvalidCreditCost,
}

/// Input for creating or rehydrating a [`Service`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDraft {
    pub id: ServiceId,
    /// Owning provider. `None` only for admin-created listings.
    pub provider_id: Option<UserId>,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub credit_cost: i64,
    pub rating_avg: RatingAverage,
    pub created_at: DateTime<Utc>,
}

/// A service customers can book.
///
/// ## Invariants
/// - `title` and `category` are non-blank.
/// - `credit_cost` is strictly positive.
/// - `rating_avg` is written only by the rating aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    id: ServiceId,
    provider_id: Option<UserId>,
    title: String,
    category: String,
    description: Option<String>,
    credit_cost: CreditAmount,
    rating_avg: RatingAverage,
    created_at: DateTime<Utc>,
}

impl Service {
    /// Validate a draft.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use homeservices::domain::{RatingAverage, Service, ServiceDraft, ServiceId};
    ///
    /// let service = Service::new(ServiceDraft {
    ///     id: ServiceId::random(),
    ///     provider_id: None,
    ///     title: "Deep cleaning".into(),
    ///     category: "Cleaning".into(),
    ///     description: None,
    ///     credit_cost: 40,
    ///     rating_avg: RatingAverage::default(),
    ///     created_at: Utc::now(),
    /// })
    /// .expect("valid listing");
    /// assert_eq!(service.credit_cost().value(), 40);
    /// ```
    pub fn new(draft: ServiceDraft) -> Result<Self, ServiceValidationError> {
        let ServiceDraft {
            id,
            provider_id,
            title,
            category,
            description,
            credit_cost,
            rating_avg,
            created_at,
        } = draft;

        let title = title.trim().to_owned();
        if title.is_empty() {
            return Err(ServiceValidationError::EmptyTitle);
        }
        let category = category.trim().to_owned();
        if category.is_empty() {
            return Err(ServiceValidationError::EmptyCategory);
        }
        let credit_cost = CreditAmount::from_signed(credit_cost)
            .map_err(|_| ServiceValidationError::InvalidCreditCost)?;
        let description = description
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(Self {
            id,
            provider_id,
            title,
            category,
            description,
            credit_cost,
            rating_avg,
            created_at,
        })
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    pub fn provider_id(&self) -> Option<&UserId> {
        self.provider_id.as_ref()
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn credit_cost(&self) -> CreditAmount {
        self.credit_cost
    }

    pub fn rating_avg(&self) -> RatingAverage {
        self.rating_avg
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy with a recomputed average.
    #[must_use]
    pub fn with_rating_avg(mut self, rating_avg: RatingAverage) -> Self {
        self.rating_avg = rating_avg;
        self
    }
}
