//! Builds the handler state over PostgreSQL or the in-memory store.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use homeservices::domain::{CredentialHasher, PaymentSignatureVerifier};
use homeservices::inbound::http::state::{HttpState, MarketplaceAdapters, MarketplaceOptions};
use homeservices::outbound::gateway::LocalPaymentGateway;
use homeservices::outbound::memory::InMemoryMarketplace;
use homeservices::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselPaymentRepository, DieselRatingRepository,
    DieselServiceRepository, DieselUserRepository,
};

use super::ServerConfig;

fn options(config: &ServerConfig) -> MarketplaceOptions {
    MarketplaceOptions {
        hasher: CredentialHasher::default(),
        allow_admin_signup: config.allow_admin_signup,
        assignment_policy: config.assignment_policy,
        verifier: PaymentSignatureVerifier::new(config.payment_secret.as_bytes().to_vec()),
        payment_key_id: config.payment_key_id.clone(),
        clock: Arc::new(DefaultClock),
    }
}

fn diesel_state(pool: &DbPool, options: MarketplaceOptions) -> HttpState {
    HttpState::from_adapters(
        MarketplaceAdapters {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            services: Arc::new(DieselServiceRepository::new(pool.clone())),
            bookings: Arc::new(DieselBookingRepository::new(pool.clone())),
            ratings: Arc::new(DieselRatingRepository::new(pool.clone())),
            payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
            gateway: Arc::new(LocalPaymentGateway::new()),
        },
        options,
    )
}

fn memory_state(options: MarketplaceOptions) -> HttpState {
    let store = Arc::new(InMemoryMarketplace::with_demo_accounts());
    HttpState::from_adapters(
        MarketplaceAdapters {
            users: store.clone(),
            services: store.clone(),
            bookings: store.clone(),
            ratings: store.clone(),
            payments: store,
            gateway: Arc::new(LocalPaymentGateway::new()),
        },
        options,
    )
}

/// PostgreSQL adapters when a pool is configured, otherwise the in-memory
/// store seeded with the demo accounts.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let options = options(config);
    let policy = config.assignment_policy;
    let state = match &config.db_pool {
        Some(pool) => {
            info!(
                assignment_policy = %policy,
                allow_admin_signup = config.allow_admin_signup,
                "using PostgreSQL adapters"
            );
            diesel_state(pool, options)
        }
        None => {
            warn!(
                assignment_policy = %policy,
                "no database configured; state lives in memory and is lost on restart"
            );
            memory_state(options)
        }
    };
    web::Data::new(state)
}
