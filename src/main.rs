use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;

use social_data::config::AppConfig;
use social_data::shared::store::Store;
use social_data::user::adapter::outgoing::security::Argon2Hasher;
use social_data::AppState;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting application...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(environment = %config.environment, "Configuration loaded");

    // Database connection
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(config.pool.max_connections)
        .min_connections(config.pool.min_connections)
        .connect_timeout(config.pool.connect_timeout)
        .acquire_timeout(config.pool.acquire_timeout)
        .idle_timeout(config.pool.idle_timeout)
        .max_lifetime(config.pool.max_lifetime)
        .sqlx_logging(config.pool.sqlx_logging);

    let conn = Database::connect(opt)
        .await
        .context("Failed to connect to database")?;

    Migrator::up(&conn, None)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations applied");

    let hasher = Argon2Hasher::new(&config.argon2).context("Invalid Argon2 parameters")?;
    let state = AppState::new(Store::with_system_clock(Arc::new(conn)), Arc::new(hasher));

    let sweeper = state.story_sweeper(config.story_sweep_interval).spawn();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    sweeper.abort();
    Ok(())
}
