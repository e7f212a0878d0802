//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and only see driving ports, so they
//! stay testable against mocks or the in-memory store.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    BookingCommand, BookingQuery, BookingRepository, CatalogueCommand, CatalogueQuery,
    LedgerRepository, LoginService, PaymentCommand, PaymentGateway, PaymentRepository,
    ProviderDirectory, RatingCommand, RatingQuery, RatingRepository, ServiceRepository,
    SignupCommand, UserProfileQuery, UserRepository,
};
use crate::domain::{
    AccountService, AssignmentPolicyKind, BookingService, CatalogueService, CredentialHasher,
    PaymentService, PaymentSignatureVerifier, RatingService, UserProfileService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub signup: Arc<dyn SignupCommand>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub catalogue: Arc<dyn CatalogueCommand>,
    pub catalogue_query: Arc<dyn CatalogueQuery>,
    pub bookings: Arc<dyn BookingCommand>,
    pub bookings_query: Arc<dyn BookingQuery>,
    pub ratings: Arc<dyn RatingCommand>,
    pub ratings_query: Arc<dyn RatingQuery>,
    pub payments: Arc<dyn PaymentCommand>,
}

/// Driven adapters the domain services are built over.
///
/// `users` serves accounts and their password hashes, the provider pool,
/// and the ledger journal; both the Diesel and the in-memory adapters
/// implement all three ports.
pub struct MarketplaceAdapters<U, S, B, R, P, G> {
    pub users: Arc<U>,
    pub services: Arc<S>,
    pub bookings: Arc<B>,
    pub ratings: Arc<R>,
    pub payments: Arc<P>,
    pub gateway: Arc<G>,
}

/// Service-level settings that do not depend on the storage backend.
pub struct MarketplaceOptions {
    pub hasher: CredentialHasher,
    /// Accept `ADMIN` as a signup role.
    pub allow_admin_signup: bool,
    pub assignment_policy: AssignmentPolicyKind,
    pub verifier: PaymentSignatureVerifier,
    pub payment_key_id: String,
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Build every domain service over `adapters` and expose them as ports.
    pub fn from_adapters<U, S, B, R, P, G>(
        adapters: MarketplaceAdapters<U, S, B, R, P, G>,
        options: MarketplaceOptions,
    ) -> Self
    where
        U: UserRepository + ProviderDirectory + LedgerRepository + 'static,
        S: ServiceRepository + 'static,
        B: BookingRepository + 'static,
        R: RatingRepository + 'static,
        P: PaymentRepository + 'static,
        G: PaymentGateway + 'static,
    {
        let MarketplaceAdapters {
            users,
            services,
            bookings,
            ratings,
            payments,
            gateway,
        } = adapters;
        let MarketplaceOptions {
            hasher,
            allow_admin_signup,
            assignment_policy,
            verifier,
            payment_key_id,
            clock,
        } = options;

        let account_service = Arc::new(
            AccountService::new(users.clone(), hasher).allow_admin_signup(allow_admin_signup),
        );
        let policy = assignment_policy.build(users.clone());
        let booking_service = Arc::new(BookingService::new(
            bookings.clone(),
            services.clone(),
            policy,
            clock.clone(),
        ));
        let catalogue_service = Arc::new(CatalogueService::new(services, clock.clone()));
        let rating_service = Arc::new(RatingService::new(bookings, ratings, clock.clone()));
        let payment_service = Arc::new(PaymentService::new(
            payments,
            gateway,
            verifier,
            payment_key_id,
            clock,
        ));

        Self {
            login: account_service.clone(),
            signup: account_service,
            profile: Arc::new(UserProfileService::new(users.clone(), users)),
            catalogue: catalogue_service.clone(),
            catalogue_query: catalogue_service,
            bookings: booking_service.clone(),
            bookings_query: booking_service,
            ratings: rating_service.clone(),
            ratings_query: rating_service,
            payments: payment_service,
        }
    }
}
