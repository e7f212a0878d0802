//! Marketplace settings and the HTTP server configuration built from them.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use homeservices::domain::AssignmentPolicyKind;
use homeservices::inbound::http::session_config::BuildMode;
use homeservices::outbound::persistence::DbPool;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PAYMENT_KEY_ID: &str = "rzp_test_local";
const DEV_PAYMENT_SECRET: &str = "dev-payment-secret";

/// Settings read from `HOMESERVICES_*` variables, config files, and flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HOMESERVICES")]
pub struct MarketplaceSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without one the marketplace runs on the in-memory store.
    pub database_url: Option<String>,
    /// Pool size for the database connection pool.
    pub db_max_connections: Option<u32>,
    /// HMAC secret shared with the payment gateway.
    pub payment_key_secret: Option<String>,
    /// Public gateway key id echoed to checkout clients.
    pub payment_key_id: Option<String>,
    /// `service-owner` or `first-available`.
    pub assignment_policy: Option<String>,
    /// Accept `ADMIN` as a signup role. Off unless set.
    pub allow_admin_signup: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid HOMESERVICES_BIND_ADDR '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid HOMESERVICES_ASSIGNMENT_POLICY: {message}")]
    AssignmentPolicy { message: String },
    #[error("HOMESERVICES_PAYMENT_KEY_SECRET is required in release builds")]
    MissingPaymentSecret,
}

impl MarketplaceSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn assignment_policy(&self) -> Result<AssignmentPolicyKind, SettingsError> {
        match self.assignment_policy.as_deref() {
            None => Ok(AssignmentPolicyKind::default()),
            Some(raw) => raw
                .parse()
                .map_err(|message: String| SettingsError::AssignmentPolicy { message }),
        }
    }

    pub fn allow_admin_signup(&self) -> bool {
        self.allow_admin_signup.unwrap_or(false)
    }

    pub fn payment_key_id(&self) -> &str {
        self.payment_key_id.as_deref().unwrap_or(DEFAULT_PAYMENT_KEY_ID)
    }

    /// Gateway secret; debug builds fall back to a fixed development secret.
    pub fn payment_key_secret(&self, mode: BuildMode) -> Result<Zeroizing<String>, SettingsError> {
        match (self.payment_key_secret.as_deref(), mode) {
            (Some(secret), _) => Ok(Zeroizing::new(secret.to_owned())),
            (None, BuildMode::Debug) => {
                warn!("HOMESERVICES_PAYMENT_KEY_SECRET not set; using the development secret");
                Ok(Zeroizing::new(DEV_PAYMENT_SECRET.to_owned()))
            }
            (None, BuildMode::Release) => Err(SettingsError::MissingPaymentSecret),
        }
    }
}

/// Everything the HTTP server needs beyond its health flag.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) assignment_policy: AssignmentPolicyKind,
    pub(crate) payment_secret: Zeroizing<String>,
    pub(crate) payment_key_id: String,
    pub(crate) allow_admin_signup: bool,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            assignment_policy: AssignmentPolicyKind::default(),
            payment_secret: Zeroizing::new(DEV_PAYMENT_SECRET.to_owned()),
            payment_key_id: DEFAULT_PAYMENT_KEY_ID.to_owned(),
            allow_admin_signup: false,
        }
    }

    /// Use PostgreSQL adapters instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_assignment_policy(mut self, policy: AssignmentPolicyKind) -> Self {
        self.assignment_policy = policy;
        self
    }

    #[must_use]
    pub fn with_admin_signup(mut self, allow: bool) -> Self {
        self.allow_admin_signup = allow;
        self
    }

    #[must_use]
    pub fn with_payment_keys(mut self, secret: Zeroizing<String>, key_id: impl Into<String>) -> Self {
        self.payment_secret = secret;
        self.payment_key_id = key_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 7] = [
        "HOMESERVICES_BIND_ADDR",
        "HOMESERVICES_DATABASE_URL",
        "HOMESERVICES_DB_MAX_CONNECTIONS",
        "HOMESERVICES_PAYMENT_KEY_SECRET",
        "HOMESERVICES_PAYMENT_KEY_ID",
        "HOMESERVICES_ASSIGNMENT_POLICY",
        "HOMESERVICES_ALLOW_ADMIN_SIGNUP",
    ];

    fn load() -> MarketplaceSettings {
        MarketplaceSettings::load_from_iter([OsString::from("homeservices")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));
        let settings = load();
        assert_eq!(settings.bind_addr().expect("default addr").port(), 8080);
        assert!(settings.database_url.is_none());
        assert_eq!(
            settings.assignment_policy().expect("default policy"),
            AssignmentPolicyKind::ServiceOwner
        );
        assert_eq!(settings.payment_key_id(), DEFAULT_PAYMENT_KEY_ID);
        assert!(!settings.allow_admin_signup());
        assert!(matches!(
            settings.payment_key_secret(BuildMode::Release),
            Err(SettingsError::MissingPaymentSecret)
        ));
        assert_eq!(
            settings
                .payment_key_secret(BuildMode::Debug)
                .expect("dev secret")
                .as_str(),
            DEV_PAYMENT_SECRET
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("HOMESERVICES_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "HOMESERVICES_DATABASE_URL",
                Some("postgres://localhost/homeservices".to_owned()),
            ),
            ("HOMESERVICES_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("HOMESERVICES_PAYMENT_KEY_SECRET", Some("s3cret".to_owned())),
            ("HOMESERVICES_PAYMENT_KEY_ID", Some("rzp_live_1".to_owned())),
            ("HOMESERVICES_ASSIGNMENT_POLICY", Some("first-available".to_owned())),
            ("HOMESERVICES_ALLOW_ADMIN_SIGNUP", Some("true".to_owned())),
        ]);
        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("addr"),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.db_max_connections, Some(4));
        assert_eq!(
            settings.assignment_policy().expect("policy"),
            AssignmentPolicyKind::FirstAvailable
        );
        assert_eq!(settings.payment_key_id(), "rzp_live_1");
        assert!(settings.allow_admin_signup());
        assert_eq!(
            settings
                .payment_key_secret(BuildMode::Release)
                .expect("secret")
                .as_str(),
            "s3cret"
        );
    }

    #[rstest]
    #[case("HOMESERVICES_BIND_ADDR", "not-an-addr")]
    #[case("HOMESERVICES_ASSIGNMENT_POLICY", "round-robin")]
    fn malformed_values_are_reported(#[case] name: &'static str, #[case] value: &str) {
        let _guard = lock_env(VARS.map(|var| {
            (var, (var == name).then(|| value.to_owned()))
        }));
        let settings = load();
        let failed = settings.bind_addr().is_err() || settings.assignment_policy().is_err();
        assert!(failed, "{name}={value} should be rejected");
    }
}
