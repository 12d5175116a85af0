//! Catalog reads for the storefront.
//!
//! Only active products are visible. The listing is cached in-process via
//! `moka` (60 second TTL) since it is read on every catalog page.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use carsi_core::ProductId;
use carsi_core::catalog::{Product, ProductImage};

use super::RepositoryError;

/// How long the active listing is served from memory.
pub const LISTING_TTL: Duration = Duration::from_secs(60);

/// Most results a search returns.
pub const SEARCH_LIMIT: i64 = 50;

const LISTING_KEY: &str = "active";

const SUMMARY_SELECT: &str = "SELECT p.id, p.name, p.slug, p.price, p.compare_price, \
     p.description, p.short_description, p.stock_quantity, p.sku, p.barcode, \
     p.is_active, p.is_featured, p.is_digital, p.weight, p.dimensions, p.tags, \
     p.category_id, p.created_at, \
     img.image_url, c.name AS category_name, c.slug AS category_slug \
     FROM products p \
     LEFT JOIN categories c ON c.id = p.category_id \
     LEFT JOIN product_images img ON img.product_id = p.id AND img.position = 0";

/// Cache for the active product listing.
pub type ListingCache = Cache<&'static str, Arc<Vec<ProductSummary>>>;

/// Build the listing cache.
#[must_use]
pub fn listing_cache() -> ListingCache {
    Cache::builder()
        .max_capacity(8)
        .time_to_live(LISTING_TTL)
        .build()
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    #[sqlx(flatten)]
    product: Product,
    image_url: Option<String>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

/// Category name and slug shown next to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

/// A product as listed: the row plus display fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: Product,
    /// Primary (position 0) image.
    pub image_url: Option<String>,
    pub category: Option<CategoryRef>,
    pub discount_percent: i64,
    pub price_display: String,
    pub in_stock: bool,
}

impl ProductSummary {
    /// Wrap a product with its display fields.
    #[must_use]
    pub fn new(product: Product, image_url: Option<String>, category: Option<CategoryRef>) -> Self {
        Self {
            discount_percent: product.discount_percent(),
            price_display: product.price().display(),
            in_stock: product.in_stock(),
            product,
            image_url,
            category,
        }
    }
}

impl From<ProductRow> for ProductSummary {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_name, row.category_slug) {
            (Some(name), Some(slug)) => Some(CategoryRef { name, slug }),
            _ => None,
        };
        Self::new(row.product, row.image_url, category)
    }
}

/// A product page: summary plus every image in position order.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub images: Vec<ProductImage>,
}

/// Escape `LIKE` wildcards so user input matches literally.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
    cache: &'a ListingCache,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a ListingCache) -> Self {
        Self { pool, cache }
    }

    /// Active products with their primary image, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Arc<Vec<ProductSummary>>, RepositoryError> {
        if let Some(products) = self.cache.get(LISTING_KEY).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SUMMARY_SELECT} WHERE p.is_active ORDER BY p.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        let products: Arc<Vec<ProductSummary>> =
            Arc::new(rows.into_iter().map(ProductSummary::from).collect());
        self.cache.insert(LISTING_KEY, Arc::clone(&products)).await;

        Ok(products)
    }

    /// A single active product with all its images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(&format!(
            "{SUMMARY_SELECT} WHERE p.is_active AND p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT id, product_id, image_url, alt_text, position
            FROM product_images
            WHERE product_id = $1
            ORDER BY position
            ",
        )
        .bind(row.product.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(ProductDetail {
            summary: row.into(),
            images,
        }))
    }

    /// An active product by ID, used to build cart lines.
    ///
    /// Always reads the database so that stock is current.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<ProductSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{SUMMARY_SELECT} WHERE p.is_active AND p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductSummary::from))
    }

    /// Active products whose name or short description contains `query`.
    ///
    /// A blank query returns nothing without touching the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<ProductSummary>, RepositoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"{SUMMARY_SELECT}
            WHERE p.is_active
              AND (p.name ILIKE $1 ESCAPE '\' OR p.short_description ILIKE $1 ESCAPE '\')
            ORDER BY p.name
            LIMIT $2"
        ))
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        debug!(results = rows.len(), "Product search");
        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }
}
