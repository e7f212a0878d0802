//! Internal Diesel row structs and their conversion to domain entities.
//!
//! Row types never leave the persistence layer. Reading a row re-runs the
//! domain constructors, so a row that violates an invariant surfaces as a
//! [`RowError`] rather than a half-valid entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Actor, Booking, BookingDraft, BookingEvent, BookingEventDraft, BookingId, BookingStatus,
    CreditAmount, CreditBalance, LedgerEntry, LedgerEntryDraft, LedgerEntryKind, Payment,
    PaymentDraft, PaymentStatus, PhoneNumber, Rating, RatingAverage, RatingDraft, RatingValue,
    Role, Service, ServiceAddress, ServiceDraft, ServiceId, User, UserId,
};

use super::schema::{bookings, booking_events, ledger_entries, payments, ratings, services, users};

/// A stored row that does not satisfy the domain invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {table} row {id}: {message}")]
pub(crate) struct RowError {
    table: &'static str,
    id: Uuid,
    message: String,
}

impl RowError {
    fn new(table: &'static str, id: Uuid, message: impl ToString) -> Self {
        Self {
            table,
            id,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub credits: i64,
}

impl TryFrom<UserRow> for User {
    type Error = RowError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|err| RowError::new("users", row.id, err))?;
        let credits =
            CreditBalance::try_from_stored(row.credits).map_err(|err| RowError::new("users", row.id, err))?;
        Ok(User::new(UserId::from_uuid(row.id), row.name, row.email, role, credits))
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    pub credits: i64,
    pub password_hash: &'a str,
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = services)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ServiceRow {
    pub id: Uuid,
    pub provider_id: Option<Uuid>,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub credit_cost: i64,
    pub rating_avg: f64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ServiceRow> for Service {
    type Error = RowError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let id = row.id;
        Service::new(ServiceDraft {
            id: ServiceId::from_uuid(row.id),
            provider_id: row.provider_id.map(UserId::from_uuid),
            title: row.title,
            category: row.category,
            description: row.description,
            credit_cost: row.credit_cost,
            rating_avg: RatingAverage::from_stored(row.rating_avg),
            created_at: row.created_at,
        })
        .map_err(|err| RowError::new("services", id, err))
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = services)]
pub(crate) struct NewServiceRow<'a> {
    pub id: Uuid,
    pub provider_id: Option<Uuid>,
    pub title: &'a str,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub credit_cost: i64,
    pub rating_avg: f64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Bookings and their events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub status: String,
    pub house_number: String,
    pub landmark: Option<String>,
    pub address_label: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RowError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |err: &dyn std::fmt::Display| RowError::new("bookings", id, err);
        let status = row.status.parse::<BookingStatus>().map_err(|err| invalid(&err))?;
        let address =
            ServiceAddress::new(&row.house_number, row.landmark.as_deref(), &row.address_label)
                .map_err(|err| invalid(&err))?;
        let phone = PhoneNumber::new(&row.phone).map_err(|err| invalid(&err))?;
        Booking::from_draft(BookingDraft {
            id: BookingId::from_uuid(row.id),
            customer_id: UserId::from_uuid(row.customer_id),
            service_id: ServiceId::from_uuid(row.service_id),
            provider_id: row.provider_id.map(UserId::from_uuid),
            status,
            address,
            phone,
            created_at: row.created_at,
        })
        .map_err(|err| invalid(&err))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub(crate) struct NewBookingRow<'a> {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub status: &'a str,
    pub house_number: &'a str,
    pub landmark: Option<&'a str>,
    pub address_label: &'a str,
    pub phone: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Booking> for NewBookingRow<'a> {
    fn from(booking: &'a Booking) -> Self {
        Self {
            id: *booking.id().as_uuid(),
            customer_id: *booking.customer_id().as_uuid(),
            service_id: *booking.service_id().as_uuid(),
            provider_id: booking.provider_id().map(|id| *id.as_uuid()),
            status: booking.status().as_str(),
            house_number: booking.address().house_number(),
            landmark: booking.address().landmark(),
            address_label: booking.address().label(),
            phone: booking.phone().as_ref(),
            created_at: booking.created_at(),
        }
    }
}

/// Status columns rewritten by a transition.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = bookings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookingStatusUpdate<'a> {
    pub status: &'a str,
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = booking_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingEventRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingEventRow> for BookingEvent {
    type Error = RowError;

    fn try_from(row: BookingEventRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |err: &dyn std::fmt::Display| RowError::new("booking_events", id, err);
        let from_status = row
            .from_status
            .as_deref()
            .map(str::parse::<BookingStatus>)
            .transpose()
            .map_err(|err| invalid(&err))?;
        let to_status = row.to_status.parse::<BookingStatus>().map_err(|err| invalid(&err))?;
        let actor = row.actor.parse::<Actor>().map_err(|err| invalid(&err))?;
        Ok(BookingEvent::from_draft(BookingEventDraft {
            id: row.id,
            booking_id: BookingId::from_uuid(row.booking_id),
            from_status,
            to_status,
            actor,
            created_at: row.created_at,
        }))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booking_events)]
pub(crate) struct NewBookingEventRow<'a> {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub from_status: Option<&'a str>,
    pub to_status: &'a str,
    pub actor: &'a str,
    pub created_at: DateTime<Utc>,
}

impl From<&BookingEvent> for NewBookingEventRow<'static> {
    fn from(event: &BookingEvent) -> Self {
        Self {
            id: event.id(),
            booking_id: *event.booking_id().as_uuid(),
            from_status: event.from_status().map(BookingStatus::as_str),
            to_status: event.to_status().as_str(),
            actor: event.actor().as_str(),
            created_at: event.created_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RowError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let rating =
            RatingValue::new(i64::from(row.rating)).map_err(|err| RowError::new("ratings", row.id, err))?;
        Ok(Rating::new(RatingDraft {
            id: row.id,
            booking_id: BookingId::from_uuid(row.booking_id),
            customer_id: UserId::from_uuid(row.customer_id),
            provider_id: UserId::from_uuid(row.provider_id),
            rating,
            review: row.review,
            created_at: row.created_at,
        }))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ratings)]
pub(crate) struct NewRatingRow<'a> {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: i16,
    pub review: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Rating> for NewRatingRow<'a> {
    fn from(rating: &'a Rating) -> Self {
        Self {
            id: rating.id(),
            booking_id: *rating.booking_id().as_uuid(),
            customer_id: *rating.customer_id().as_uuid(),
            provider_id: *rating.provider_id().as_uuid(),
            rating: i16::from(rating.rating().value()),
            review: rating.review(),
            created_at: rating.created_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub external_payment_id: Option<String>,
    pub credits_added: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RowError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let credits_added =
            CreditAmount::from_signed(row.credits_added).map_err(|err| RowError::new("payments", id, err))?;
        let status = row
            .status
            .parse::<PaymentStatus>()
            .map_err(|err| RowError::new("payments", id, err))?;
        Ok(Payment::from_draft(PaymentDraft {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            order_id: row.order_id,
            external_payment_id: row.external_payment_id,
            credits_added,
            status,
            created_at: row.created_at,
        }))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: &'a str,
    pub external_payment_id: Option<&'a str>,
    pub credits_added: i64,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ledger_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LedgerEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount: i64,
    pub balance_after: i64,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = RowError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |err: &dyn std::fmt::Display| RowError::new("ledger_entries", id, err);
        let kind = row.kind.parse::<LedgerEntryKind>().map_err(|err| invalid(&err))?;
        let amount = CreditAmount::from_signed(row.amount).map_err(|err| invalid(&err))?;
        let balance_after =
            CreditBalance::try_from_stored(row.balance_after).map_err(|err| invalid(&err))?;
        Ok(LedgerEntry::from_draft(LedgerEntryDraft {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            kind,
            amount,
            balance_after,
            reference: row.reference,
            created_at: row.created_at,
        }))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ledger_entries)]
pub(crate) struct NewLedgerEntryRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub amount: i64,
    pub balance_after: i64,
    pub reference: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a LedgerEntry> for NewLedgerEntryRow<'a> {
    type Error = crate::domain::LedgerError;

    fn try_from(entry: &'a LedgerEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entry.id(),
            user_id: *entry.user_id().as_uuid(),
            kind: entry.kind().as_str(),
            amount: entry.amount().to_stored()?,
            balance_after: entry.balance_after().to_stored()?,
            reference: entry.reference(),
            created_at: entry.created_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::test_fixtures::{booking, fixture_timestamp};

    fn booking_row(status: &str, provider_id: Option<Uuid>) -> BookingRow {
        BookingRow {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            provider_id,
            status: status.to_owned(),
            house_number: "12".to_owned(),
            landmark: None,
            address_label: "Home".to_owned(),
            phone: "9876543210".to_owned(),
            created_at: fixture_timestamp(),
        }
    }

    #[rstest]
    fn booking_row_round_trips_through_insert_shape() {
        let original = booking(UserId::random(), Some(UserId::random()), BookingStatus::Assigned);
        let insert = NewBookingRow::from(&original);
        let row = BookingRow {
            id: insert.id,
            customer_id: insert.customer_id,
            service_id: insert.service_id,
            provider_id: insert.provider_id,
            status: insert.status.to_owned(),
            house_number: insert.house_number.to_owned(),
            landmark: insert.landmark.map(str::to_owned),
            address_label: insert.address_label.to_owned(),
            phone: insert.phone.to_owned(),
            created_at: insert.created_at,
        };
        assert_eq!(Booking::try_from(row).expect("valid row"), original);
    }

    #[rstest]
    #[case("ASSIGNED", None)]
    #[case("ON_HOLD", Some(Uuid::new_v4()))]
    fn booking_rows_breaking_invariants_are_rejected(
        #[case] status: &str,
        #[case] provider_id: Option<Uuid>,
    ) {
        let err = Booking::try_from(booking_row(status, provider_id)).expect_err("invalid");
        assert!(err.to_string().contains("invalid bookings row"));
    }

    #[rstest]
    fn negative_balance_row_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Casey".to_owned(),
            email: "casey@example.com".to_owned(),
            role: "CUSTOMER".to_owned(),
            credits: -5,
        };
        assert!(User::try_from(row).is_err());
    }

    #[rstest]
    fn unknown_actor_is_rejected() {
        let row = BookingEventRow {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            from_status: Some("PENDING".to_owned()),
            to_status: "ASSIGNED".to_owned(),
            actor: "ROBOT".to_owned(),
            created_at: fixture_timestamp(),
        };
        assert!(BookingEvent::try_from(row).is_err());
    }
}
