//! Shared builders for domain service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{
    Booking, BookingDraft, BookingId, BookingStatus, Caller, PhoneNumber, RatingAverage, Role,
    Service, ServiceAddress, ServiceDraft, ServiceId, UserId,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn caller(role: Role) -> Caller {
    Caller::new(UserId::random(), role)
}

pub(crate) fn service_owned_by(owner: Option<UserId>, cost: i64) -> Service {
    Service::new(ServiceDraft {
        id: ServiceId::random(),
        provider_id: owner,
        title: "Kitchen deep clean".to_owned(),
        category: "Cleaning".to_owned(),
        description: Some("Degrease and sanitise".to_owned()),
        credit_cost: cost,
        rating_avg: RatingAverage::default(),
        created_at: fixture_timestamp(),
    })
    .expect("valid service")
}

pub(crate) fn address() -> ServiceAddress {
    ServiceAddress::new("221B", Some("Opposite the bakery"), "Home").expect("valid address")
}

pub(crate) fn phone() -> PhoneNumber {
    PhoneNumber::new("+91 98765 43210").expect("valid phone")
}

pub(crate) fn booking(
    customer: UserId,
    provider: Option<UserId>,
    status: BookingStatus,
) -> Booking {
    Booking::from_draft(BookingDraft {
        id: BookingId::random(),
        customer_id: customer,
        service_id: ServiceId::random(),
        provider_id: provider,
        status,
        address: address(),
        phone: phone(),
        created_at: fixture_timestamp(),
    })
    .expect("valid booking")
}
