//! Shared world for marketplace integration suites.
//!
//! Every suite drives the real domain services over one
//! [`InMemoryMarketplace`], so ledger and event-log assertions can read the
//! store directly.

use std::sync::Arc;

use homeservices::domain::ports::{CreateBookingRequest, CreateServiceRequest};
use homeservices::domain::{
    AssignmentPolicyKind, Caller, CredentialHasher, CreditBalance, PaymentSignatureVerifier, PhoneNumber, Role,
    Service, ServiceAddress, User, UserId,
};
use homeservices::inbound::http::state::{HttpState, MarketplaceAdapters, MarketplaceOptions};
use homeservices::outbound::gateway::LocalPaymentGateway;
use homeservices::outbound::memory::InMemoryMarketplace;
use mockable::DefaultClock;

pub const PAYMENT_SECRET: &str = "integration_secret";
pub const PAYMENT_KEY_ID: &str = "rzp_test_integration";

/// Store, wired services, and one account per role.
pub struct World {
    pub store: Arc<InMemoryMarketplace>,
    pub state: HttpState,
    pub customer: Caller,
    pub provider: Caller,
    pub admin: Caller,
}

fn account(store: &InMemoryMarketplace, name: &str, role: Role, credits: u64) -> Caller {
    let id = UserId::random();
    let email = format!("{}@example.com", name.to_lowercase());
    store.insert_user(User::new(id, name, email, role, CreditBalance::new(credits)));
    Caller::new(id, role)
}

impl World {
    /// Fresh store with a customer holding `credits`, one provider, and one admin.
    pub fn with_customer_credits(credits: u64, policy: AssignmentPolicyKind) -> Self {
        let store = Arc::new(InMemoryMarketplace::new());
        let customer = account(&store, "Customer", Role::Customer, credits);
        let provider = account(&store, "Provider", Role::Provider, 0);
        let admin = account(&store, "Admin", Role::Admin, 0);
        let state = HttpState::from_adapters(
            MarketplaceAdapters {
                users: store.clone(),
                services: store.clone(),
                bookings: store.clone(),
                ratings: store.clone(),
                payments: store.clone(),
                gateway: Arc::new(LocalPaymentGateway::new()),
            },
            MarketplaceOptions {
                hasher: CredentialHasher::low_cost(),
                allow_admin_signup: false,
                assignment_policy: policy,
                verifier: PaymentSignatureVerifier::new(PAYMENT_SECRET),
                payment_key_id: PAYMENT_KEY_ID.to_owned(),
                clock: Arc::new(DefaultClock),
            },
        );
        Self {
            store,
            state,
            customer,
            provider,
            admin,
        }
    }

    /// Another account sharing the same store.
    #[allow(dead_code, reason = "not every suite needs extra accounts")]
    pub fn add_account(&self, name: &str, role: Role, credits: u64) -> Caller {
        account(&self.store, name, role, credits)
    }

    /// A listing owned by `owner` costing `cost` credits.
    pub async fn listing(&self, owner: &Caller, cost: i64) -> Service {
        self.state
            .catalogue
            .create_service(
                owner,
                CreateServiceRequest {
                    title: "Deep cleaning".to_owned(),
                    category: "Cleaning".to_owned(),
                    description: None,
                    credit_cost: cost,
                },
            )
            .await
            .expect("listing created")
    }

    pub fn balance(&self, caller: &Caller) -> u64 {
        self.store
            .user(caller.id())
            .map(|user| user.credits().value())
            .expect("account exists")
    }
}

/// A well-formed booking request for `service`.
pub fn booking_request(service: &Service) -> CreateBookingRequest {
    CreateBookingRequest {
        service_id: *service.id(),
        address: ServiceAddress::new("12B", Some("Opposite the temple"), "Home").expect("address"),
        phone: PhoneNumber::new("+91 98765 43210").expect("phone"),
    }
}
