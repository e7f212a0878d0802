//! Marketplace entry-point: loads settings, prepares storage, and serves the
//! REST API with health endpoints and (in debug builds) Swagger UI.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use homeservices::domain::{AccountService, CredentialHasher};
use homeservices::inbound::http::health::HealthState;
use homeservices::inbound::http::session_config::{BuildMode, session_settings_from_env};
use homeservices::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use server::{MarketplaceSettings, ServerConfig, create_server};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

async fn connect(settings: &MarketplaceSettings, database_url: &str) -> std::io::Result<DbPool> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .map_err(|err| startup_error("migration task failed", err))?
        .map_err(|err| startup_error("migrations failed", err))?;
    info!(applied, "database schema up to date");

    let mut pool_config = PoolConfig::new(database_url);
    if let Some(max) = settings.db_max_connections {
        pool_config = pool_config.with_max_size(max);
    }
    DbPool::new(pool_config)
        .await
        .map_err(|err| startup_error("database pool", err))
}

/// Debug builds create the demo accounts on a database that lacks them.
async fn seed_demo_accounts(pool: &DbPool, mode: BuildMode) -> std::io::Result<()> {
    if mode != BuildMode::Debug {
        return Ok(());
    }
    let accounts = AccountService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        CredentialHasher::default(),
    );
    let created = accounts
        .ensure_demo_accounts()
        .await
        .map_err(|err| startup_error("demo accounts", err))?;
    if created > 0 {
        info!(created, "demo accounts seeded");
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let mode = BuildMode::from_debug_assertions();
    let settings = MarketplaceSettings::load_from_iter(std::env::args_os())
        .map_err(|err| startup_error("settings", err))?;
    let session = session_settings_from_env(&DefaultEnv::new(), mode)
        .map_err(|err| startup_error("session settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| startup_error("settings", err))?;
    let assignment_policy = settings
        .assignment_policy()
        .map_err(|err| startup_error("settings", err))?;
    let payment_secret = settings
        .payment_key_secret(mode)
        .map_err(|err| startup_error("settings", err))?;

    let mut config = ServerConfig::new(session.key, session.cookie_secure, session.same_site, bind_addr)
        .with_assignment_policy(assignment_policy)
        .with_admin_signup(settings.allow_admin_signup())
        .with_payment_keys(payment_secret, settings.payment_key_id());
    if let Some(database_url) = settings.database_url.as_deref() {
        let pool = connect(&settings, database_url).await?;
        seed_demo_accounts(&pool, mode).await?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, %assignment_policy, "marketplace listening");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
