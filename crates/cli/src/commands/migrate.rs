//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin
//!
//! Both fall back to `DATABASE_URL`.
//!
//! # Migration Files
//!
//! Catalog migrations: `crates/admin/migrations/`. The storefront's only
//! table is the session store, created by `tower-sessions-sqlx-store`.

use carsi_admin::config::{ConfigError, get_database_url};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

async fn connect(primary_key: &str) -> Result<PgPool, MigrationError> {
    let database_url = get_database_url(primary_key)?;
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

/// Create the storefront session table.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or the DDL fails.
pub async fn storefront() -> Result<(), MigrationError> {
    tracing::info!("Connecting to storefront database...");
    let pool = connect("STOREFRONT_DATABASE_URL").await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}

/// Run the catalog migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    tracing::info!("Connecting to admin database...");
    let pool = connect("ADMIN_DATABASE_URL").await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
