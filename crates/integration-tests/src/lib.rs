//! Integration tests for Çarşı.
//!
//! # Running Tests
//!
//! ```bash
//! # Tests that need nothing external
//! cargo test -p carsi-integration-tests
//!
//! # Database- and server-backed tests
//! DATABASE_URL=postgres://localhost/carsi_test \
//!     cargo test -p carsi-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `bulk_import` - workbook and feed sources through the import routine
//! - `catalog_database` - import into `PostgreSQL`, read back through the storefront
//! - `servers` - running storefront and admin binaries over HTTP
//!
//! This crate only holds shared fixtures.

use std::sync::Mutex;

use chrono::Utc;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use carsi_admin::import::CatalogSink;
use carsi_core::catalog::{Category, NewProduct, Product};
use carsi_core::{CategoryId, ProductId};

/// Database for ignored tests; falls back to a local default.
#[must_use]
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/carsi_test".to_string())
}

/// Build an `.xlsx` workbook: the first row is the header, all cells text.
///
/// # Errors
///
/// Returns `XlsxError` if the workbook cannot be written.
pub fn workbook(rows: &[&[&str]]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, cells) in rows.iter().enumerate() {
        let r = u32::try_from(r).unwrap_or(u32::MAX);
        for (c, value) in cells.iter().enumerate() {
            let c = u16::try_from(c).unwrap_or(u16::MAX);
            if !value.is_empty() {
                sheet.write_string(r, c, *value)?;
            }
        }
    }
    workbook.save_to_buffer()
}

/// Write refused by [`MemoryCatalog`].
#[derive(Debug, Error)]
#[error("slug '{0}' already exists")]
pub struct SlugTaken(pub String);

/// In-memory catalog with the same slug uniqueness as the real tables.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    pub categories: Mutex<Vec<Category>>,
    pub products: Mutex<Vec<Product>>,
    pub primary_images: Mutex<Vec<(ProductId, String)>>,
}

impl MemoryCatalog {
    /// Snapshot of the inserted products.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.products.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Snapshot of the categories.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.categories.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Primary image URL of a product.
    #[must_use]
    pub fn primary_image(&self, id: ProductId) -> Option<String> {
        self.primary_images
            .lock()
            .ok()?
            .iter()
            .find(|(product_id, _)| *product_id == id)
            .map(|(_, url)| url.clone())
    }
}

impl CatalogSink for MemoryCatalog {
    type Error = SlugTaken;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, Self::Error> {
        Ok(self
            .categories()
            .into_iter()
            .find(|c| c.slug == slug))
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category, Self::Error> {
        let Ok(mut categories) = self.categories.lock() else {
            return Err(SlugTaken(slug.to_string()));
        };
        if let Some(existing) = categories.iter().find(|c| c.slug == slug) {
            return Ok(existing.clone());
        }
        let category = Category {
            id: CategoryId::random(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        categories.push(category.clone());
        Ok(category)
    }

    async fn insert_product(
        &self,
        p: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, Self::Error> {
        let Ok(mut products) = self.products.lock() else {
            return Err(SlugTaken(p.slug.clone()));
        };
        if products.iter().any(|existing| existing.slug == p.slug) {
            return Err(SlugTaken(p.slug.clone()));
        }
        let product = Product {
            id: ProductId::random(),
            name: p.name.clone(),
            slug: p.slug.clone(),
            price: p.price,
            compare_price: p.compare_price,
            description: p.description.clone(),
            short_description: p.short_description.clone(),
            stock_quantity: p.stock_quantity,
            sku: p.sku.clone(),
            barcode: p.barcode.clone(),
            is_active: p.is_active,
            is_featured: p.is_featured,
            is_digital: p.is_digital,
            weight: p.weight,
            dimensions: p.dimensions.clone(),
            tags: p.tags.clone(),
            category_id: p.category_id,
            created_at: Utc::now(),
        };
        if let (Some(url), Ok(mut images)) = (image_url, self.primary_images.lock()) {
            images.push((product.id, url.to_string()));
        }
        products.push(product.clone());
        Ok(product)
    }
}
