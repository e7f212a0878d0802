//! Append-only booking event log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BookingStatus;
use crate::domain::BookingId;

/// Who caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Customer,
    Provider,
    System,
    Admin,
}

impl Actor {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Provider => "PROVIDER",
            Self::System => "SYSTEM",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Actor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "PROVIDER" => Ok(Self::Provider),
            "SYSTEM" => Ok(Self::System),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown actor: {other}")),
        }
    }
}

/// Stored event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEventDraft {
    pub id: Uuid,
    pub booking_id: BookingId,
    pub from_status: Option<BookingStatus>,
    pub to_status: BookingStatus,
    pub actor: Actor,
    pub created_at: DateTime<Utc>,
}

/// One recorded edge of a booking's lifecycle. `from_status` is `None` only
/// for the creation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    id: Uuid,
    booking_id: BookingId,
    from_status: Option<BookingStatus>,
    to_status: BookingStatus,
    actor: Actor,
    created_at: DateTime<Utc>,
}

impl BookingEvent {
    pub(super) fn record(
        booking_id: BookingId,
        from_status: Option<BookingStatus>,
        to_status: BookingStatus,
        actor: Actor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            from_status,
            to_status,
            actor,
            created_at,
        }
    }

    /// Rehydrate a stored event.
    pub fn from_draft(draft: BookingEventDraft) -> Self {
        Self {
            id: draft.id,
            booking_id: draft.booking_id,
            from_status: draft.from_status,
            to_status: draft.to_status,
            actor: draft.actor,
            created_at: draft.created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn booking_id(&self) -> &BookingId {
        &self.booking_id
    }

    pub fn from_status(&self) -> Option<BookingStatus> {
        self.from_status
    }

    pub fn to_status(&self) -> BookingStatus {
        self.to_status
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Canonical history of a single booking, ordered by `created_at`.
///
/// Events sharing a timestamp keep the order they were appended in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingHistory(Vec<BookingEvent>);

impl BookingHistory {
    /// Build a history from events in append order.
    pub fn new(mut events: Vec<BookingEvent>) -> Self {
        events.sort_by_key(BookingEvent::created_at);
        Self(events)
    }

    pub fn events(&self) -> &[BookingEvent] {
        &self.0
    }

    pub fn into_events(self) -> Vec<BookingEvent> {
        self.0
    }

    /// Status implied by the log: the target of the latest event.
    pub fn current_status(&self) -> Option<BookingStatus> {
        self.0.last().map(BookingEvent::to_status)
    }

    /// Every event starts where the previous one ended and only the first
    /// event lacks a source status.
    pub fn is_contiguous(&self) -> bool {
        let mut expected_from = None;
        for event in &self.0 {
            if event.from_status != expected_from {
                return false;
            }
            expected_from = Some(event.to_status);
        }
        true
    }
}
