//! In-memory marketplace store.
//!
//! Every repository port is implemented over one mutex-guarded state, so
//! each call runs as if inside a serializable transaction: the read-check-
//! write sequence of a debit, a transition, or a settlement cannot interleave
//! with another. Used by tests and by the server when no database is
//! configured.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BookingOpening, BookingRepository, BookingRepositoryError, DEMO_ACCOUNTS, DEMO_PASSWORD,
    LedgerRepository, LedgerRepositoryError, PaymentRepository, PaymentRepositoryError,
    ProviderDirectory, ProviderDirectoryError, RatingRepository, RatingRepositoryError,
    ServiceRepository, ServiceRepositoryError, Settlement, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Booking, BookingAction, BookingEvent, BookingHistory, BookingId, BookingStatus,
    CredentialHasher, CreditBalance, Ledger, LedgerEntry, LedgerError, Payment, Rating,
    RatingAverage, Role, Service, ServiceId, Transition, User, UserId,
};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    password_hashes: HashMap<UserId, String>,
    services: Vec<Service>,
    bookings: Vec<Booking>,
    events: Vec<BookingEvent>,
    ratings: Vec<Rating>,
    payments: Vec<Payment>,
    ledger: Vec<LedgerEntry>,
}

impl State {
    fn user_index(&self, id: &UserId) -> Option<usize> {
        self.users.iter().position(|user| user.id() == id)
    }

    fn booking_index(&self, id: &BookingId) -> Option<usize> {
        self.bookings.iter().position(|booking| booking.id() == id)
    }

    /// Append a new account, journalling any opening balance.
    fn open_account(&mut self, user: User) {
        if let Ok(Some(posting)) = Ledger::opening(user.id(), user.credits(), Utc::now()) {
            self.ledger.push(posting.entry);
        }
        self.users.push(user);
    }
}

/// Newest first; ties keep the most recently inserted first.
fn newest_first<T>(
    items: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut listed: Vec<T> = items.rev().collect();
    listed.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    listed
}

/// Mutex-backed implementation of every driven repository port.
#[derive(Debug, Default)]
pub struct InMemoryMarketplace {
    state: Mutex<State>,
}

impl InMemoryMarketplace {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the demo accounts, all using [`DEMO_PASSWORD`].
    pub fn with_demo_accounts() -> Self {
        let store = Self::new();
        let hash = CredentialHasher::low_cost().hash(DEMO_PASSWORD).ok();
        for account in DEMO_ACCOUNTS {
            let Ok(id) = UserId::new(account.id) else {
                continue;
            };
            store.insert_user(User::new(
                id,
                account.name,
                account.email,
                account.role,
                CreditBalance::new(account.credits),
            ));
            if let (Some(hash), Ok(mut state)) = (hash.as_ref(), store.lock()) {
                state.password_hashes.insert(id, hash.clone());
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }

    /// Add an account, or update the profile of an existing one.
    ///
    /// A new account's opening balance is journalled as a credit so replaying
    /// the ledger reproduces it. Replacing an account keeps its stored
    /// balance; credits only move through ledger postings.
    pub fn insert_user(&self, user: User) {
        let Ok(mut state) = self.lock() else {
            return;
        };
        if let Some(index) = state.user_index(user.id()) {
            let balance = state.users[index].credits();
            state.users[index] = user.with_credits(balance);
            return;
        }
        state.open_account(user);
    }

    /// Snapshot of an account.
    pub fn user(&self, id: &UserId) -> Option<User> {
        let state = self.lock().ok()?;
        state.user_index(id).map(|index| state.users[index].clone())
    }

    /// Snapshot of a listing.
    pub fn service(&self, id: &ServiceId) -> Option<Service> {
        let state = self.lock().ok()?;
        state.services.iter().find(|service| service.id() == id).cloned()
    }

    /// Number of stored bookings.
    pub fn booking_count(&self) -> usize {
        self.lock().map(|state| state.bookings.len()).unwrap_or_default()
    }

    /// Number of stored ratings.
    pub fn rating_count(&self) -> usize {
        self.lock().map(|state| state.ratings.len()).unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for InMemoryMarketplace {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.user_index(id).map(|index| state.users[index].clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state
            .users
            .iter()
            .find(|user| user.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: &User, password_hash: &str) -> Result<(), UserRepositoryError> {
        let mut state = self.lock().map_err(UserRepositoryError::query)?;
        if state
            .users
            .iter()
            .any(|existing| existing.email().eq_ignore_ascii_case(user.email()))
        {
            return Err(UserRepositoryError::email_taken(user.email()));
        }
        if state.user_index(user.id()).is_some() {
            return Err(UserRepositoryError::query(format!("user {} already exists", user.id())));
        }
        state.password_hashes.insert(*user.id(), password_hash.to_owned());
        state.open_account(user.clone());
        Ok(())
    }

    async fn password_hash(&self, id: &UserId) -> Result<Option<String>, UserRepositoryError> {
        let state = self.lock().map_err(UserRepositoryError::query)?;
        Ok(state.password_hashes.get(id).cloned())
    }
}

#[async_trait]
impl ProviderDirectory for InMemoryMarketplace {
    async fn first_available_provider(&self) -> Result<Option<UserId>, ProviderDirectoryError> {
        let state = self.lock().map_err(ProviderDirectoryError::query)?;
        Ok(state
            .users
            .iter()
            .find(|user| user.role() == Role::Provider)
            .map(|user| *user.id()))
    }
}

#[async_trait]
impl ServiceRepository for InMemoryMarketplace {
    async fn save(&self, service: &Service) -> Result<(), ServiceRepositoryError> {
        let mut state = self.lock().map_err(ServiceRepositoryError::query)?;
        if let Some(owner) = service.provider_id()
            && state.user_index(owner).is_none()
        {
            return Err(ServiceRepositoryError::unknown_provider(owner.to_string()));
        }
        match state.services.iter().position(|existing| existing.id() == service.id()) {
            Some(index) => state.services[index] = service.clone(),
            None => state.services.push(service.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ServiceId) -> Result<Option<Service>, ServiceRepositoryError> {
        let state = self.lock().map_err(ServiceRepositoryError::query)?;
        Ok(state.services.iter().find(|service| service.id() == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Service>, ServiceRepositoryError> {
        let state = self.lock().map_err(ServiceRepositoryError::query)?;
        Ok(newest_first(state.services.iter().cloned(), Service::created_at))
    }

    async fn list_by_provider(&self, provider_id: &UserId) -> Result<Vec<Service>, ServiceRepositoryError> {
        let state = self.lock().map_err(ServiceRepositoryError::query)?;
        let owned = state
            .services
            .iter()
            .filter(|service| service.provider_id() == Some(provider_id))
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(owned.into_iter(), Service::created_at))
    }
}

#[async_trait]
impl BookingRepository for InMemoryMarketplace {
    async fn open_booking(&self, opening: &BookingOpening) -> Result<CreditBalance, BookingRepositoryError> {
        let mut state = self.lock().map_err(BookingRepositoryError::query)?;
        let booking = &opening.booking;
        let index = state
            .user_index(booking.customer_id())
            .ok_or_else(|| BookingRepositoryError::customer_not_found(booking.customer_id().to_string()))?;

        let customer = state.users[index].clone();
        let posting = Ledger::debit(
            customer.id(),
            customer.credits(),
            opening.cost,
            booking.id().to_string(),
            booking.created_at(),
        )
        .map_err(BookingRepositoryError::from_debit)?;

        state.users[index] = customer.with_credits(posting.balance);
        state.ledger.push(posting.entry);
        state.bookings.push(booking.clone());
        state.events.extend(opening.events.iter().cloned());
        Ok(posting.balance)
    }

    async fn transition(
        &self,
        booking_id: &BookingId,
        action: &BookingAction,
        at: DateTime<Utc>,
    ) -> Result<Transition, BookingRepositoryError> {
        let mut state = self.lock().map_err(BookingRepositoryError::query)?;
        let index = state
            .booking_index(booking_id)
            .ok_or_else(|| BookingRepositoryError::not_found(booking_id.to_string()))?;
        let transition = state.bookings[index]
            .apply(action, at)
            .map_err(BookingRepositoryError::transition)?;
        state.bookings[index] = transition.booking.clone();
        state.events.push(transition.event.clone());
        Ok(transition)
    }

    async fn find_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        let state = self.lock().map_err(BookingRepositoryError::query)?;
        Ok(state.booking_index(booking_id).map(|index| state.bookings[index].clone()))
    }

    async fn history(&self, booking_id: &BookingId) -> Result<BookingHistory, BookingRepositoryError> {
        let state = self.lock().map_err(BookingRepositoryError::query)?;
        Ok(BookingHistory::new(
            state
                .events
                .iter()
                .filter(|event| event.booking_id() == booking_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.lock().map_err(BookingRepositoryError::query)?;
        let owned = state
            .bookings
            .iter()
            .filter(|booking| booking.customer_id() == customer_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(owned.into_iter(), Booking::created_at))
    }

    async fn list_assigned_to(&self, provider_id: &UserId) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.lock().map_err(BookingRepositoryError::query)?;
        let assigned = state
            .bookings
            .iter()
            .filter(|booking| {
                booking.status() == BookingStatus::Assigned && booking.is_assigned_to(provider_id)
            })
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(assigned.into_iter(), Booking::created_at))
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError> {
        let state = self.lock().map_err(BookingRepositoryError::query)?;
        Ok(newest_first(state.bookings.iter().cloned(), Booking::created_at))
    }
}

#[async_trait]
impl RatingRepository for InMemoryMarketplace {
    async fn record(&self, rating: &Rating, service_id: &ServiceId) -> Result<RatingAverage, RatingRepositoryError> {
        let mut state = self.lock().map_err(RatingRepositoryError::query)?;
        let completed = state
            .booking_index(rating.booking_id())
            .is_some_and(|index| state.bookings[index].status() == BookingStatus::Completed);
        if !completed {
            return Err(RatingRepositoryError::not_completed(rating.booking_id().to_string()));
        }
        if state
            .ratings
            .iter()
            .any(|existing| existing.booking_id() == rating.booking_id())
        {
            return Err(RatingRepositoryError::already_rated(rating.booking_id().to_string()));
        }
        let service_index = state
            .services
            .iter()
            .position(|service| service.id() == service_id)
            .ok_or_else(|| RatingRepositoryError::query(format!("service {service_id} not found")))?;

        state.ratings.push(rating.clone());
        let average = RatingAverage::from_values(
            state
                .ratings
                .iter()
                .filter(|stored| stored.provider_id() == rating.provider_id())
                .map(Rating::rating),
        );
        let updated = state.services[service_index].clone().with_rating_avg(average);
        state.services[service_index] = updated;
        Ok(average)
    }

    async fn find_by_booking(&self, booking_id: &BookingId) -> Result<Option<Rating>, RatingRepositoryError> {
        let state = self.lock().map_err(RatingRepositoryError::query)?;
        Ok(state
            .ratings
            .iter()
            .find(|rating| rating.booking_id() == booking_id)
            .cloned())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryMarketplace {
    async fn create(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let mut state = self.lock().map_err(PaymentRepositoryError::query)?;
        if state
            .payments
            .iter()
            .any(|existing| existing.order_id() == payment.order_id())
        {
            return Err(PaymentRepositoryError::query(format!(
                "order {} already recorded",
                payment.order_id()
            )));
        }
        state.payments.push(payment.clone());
        Ok(())
    }

    async fn settle(
        &self,
        order_id: &str,
        external_payment_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Settlement, PaymentRepositoryError> {
        let mut state = self.lock().map_err(PaymentRepositoryError::query)?;
        let payment_index = state
            .payments
            .iter()
            .position(|payment| payment.order_id() == order_id)
            .ok_or_else(|| PaymentRepositoryError::not_found(order_id))?;
        let payment = state.payments[payment_index].clone();
        let user_index = state
            .user_index(payment.user_id())
            .ok_or_else(|| PaymentRepositoryError::user_not_found(payment.user_id().to_string()))?;
        let purchaser = state.users[user_index].clone();

        if payment.is_settled() {
            return Ok(Settlement {
                payment,
                balance: purchaser.credits(),
                credited: false,
            });
        }

        let posting = Ledger::credit(
            purchaser.id(),
            purchaser.credits(),
            payment.credits_added(),
            order_id,
            at,
        )
        .map_err(|err| match err {
            LedgerError::Overflow => PaymentRepositoryError::balance_overflow(purchaser.id().to_string()),
            other => PaymentRepositoryError::query(other.to_string()),
        })?;

        let settled = payment.settle(external_payment_id);
        state.users[user_index] = purchaser.with_credits(posting.balance);
        state.ledger.push(posting.entry);
        state.payments[payment_index] = settled.clone();
        Ok(Settlement {
            payment: settled,
            balance: posting.balance,
            credited: true,
        })
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, PaymentRepositoryError> {
        let state = self.lock().map_err(PaymentRepositoryError::query)?;
        Ok(state
            .payments
            .iter()
            .find(|payment| payment.order_id() == order_id)
            .cloned())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryMarketplace {
    async fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>, LedgerRepositoryError> {
        let state = self.lock().map_err(LedgerRepositoryError::query)?;
        Ok(state
            .ledger
            .iter()
            .filter(|entry| entry.user_id() == user_id)
            .cloned()
            .collect())
    }
}
