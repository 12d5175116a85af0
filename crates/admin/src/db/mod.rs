//! Catalog database operations for the admin panel.
//!
//! ## Tables
//!
//! - `categories` - Product categories, unique by slug
//! - `products` - Catalog products, unique by slug
//! - `product_images` - Product images, unique by `(product_id, position)`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p carsi-cli -- migrate admin
//! ```

pub mod categories;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use carsi_core::catalog::{Category, NewProduct, Product};

pub use categories::CategoryRepository;
pub use products::{ProductRepository, ProductUpdate};

use crate::import::CatalogSink;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Import sink backed by the catalog tables.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogSink for PgCatalog {
    type Error = RepositoryError;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, Self::Error> {
        CategoryRepository::new(&self.pool).get_by_slug(slug).await
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, Self::Error> {
        CategoryRepository::new(&self.pool).create(name, slug).await
    }

    async fn insert_product(
        &self,
        product: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, Self::Error> {
        ProductRepository::new(&self.pool)
            .insert(product, image_url)
            .await
    }
}
