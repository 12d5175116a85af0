//! Product repository for the admin panel.
//!
//! Inserts come from the bulk import; updates come from the edit form.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use carsi_core::catalog::{NewProduct, Product, ProductImage};
use carsi_core::slug::slugify;
use carsi_core::{CategoryId, ProductId};

use super::{RepositoryError, map_unique_violation};

const PRODUCT_COLUMNS: &str = "id, name, slug, price, compare_price, description, \
     short_description, stock_quantity, sku, barcode, is_active, is_featured, \
     is_digital, weight, dimensions, tags, category_id, created_at";

/// Editable product fields.
///
/// The slug is not editable; it is regenerated from `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    pub stock_quantity: i32,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub barcode: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_digital: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
    /// New primary image, if any.
    pub image_url: Option<String>,
}

/// Why an update was refused before touching the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateRejection {
    #[error("name has no letters or digits")]
    EmptySlug,
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("stock cannot be negative")]
    NegativeStock,
}

impl ProductUpdate {
    /// Check the update and derive its slug.
    ///
    /// # Errors
    ///
    /// Returns an `UpdateRejection` naming the first invalid field.
    pub fn validated_slug(&self) -> Result<String, UpdateRejection> {
        let slug = slugify(&self.name);
        if slug.is_empty() {
            return Err(UpdateRejection::EmptySlug);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(UpdateRejection::NegativePrice);
        }
        if self.stock_quantity < 0 {
            return Err(UpdateRejection::NegativeStock);
        }
        Ok(slug)
    }
}

/// Repository for product writes and edit-form reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Images of a product, primary first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT id, product_id, image_url, alt_text, position
            FROM product_images
            WHERE product_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Insert a new product and, when given, its primary image.
    ///
    /// Both writes share a transaction: a failed image write leaves no
    /// product behind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self, product), fields(slug = %product.slug))]
    pub async fn insert(
        &self,
        product: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (
                name, slug, price, compare_price, description, short_description,
                stock_quantity, sku, barcode, is_active, is_featured, is_digital,
                weight, dimensions, tags, category_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.compare_price)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.stock_quantity)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(product.is_digital)
        .bind(product.weight)
        .bind(&product.dimensions)
        .bind(&product.tags)
        .bind(product.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || format!("slug '{}' already exists", product.slug)))?;

        if let Some(url) = image_url {
            upsert_primary_image(&mut *tx, created.id, url, &created.name).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Overwrite every editable field of a product.
    ///
    /// The slug is regenerated from the new name. When `image_url` is set, the
    /// primary image is replaced (or created).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let slug = slugify(&update.name);
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products SET
                name = $2, slug = $3, price = $4, compare_price = $5,
                description = $6, short_description = $7, stock_quantity = $8,
                sku = $9, barcode = $10, is_active = $11, is_featured = $12,
                is_digital = $13, weight = $14, dimensions = $15, tags = $16,
                category_id = $17, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&slug)
        .bind(update.price)
        .bind(update.compare_price)
        .bind(&update.description)
        .bind(&update.short_description)
        .bind(update.stock_quantity)
        .bind(&update.sku)
        .bind(&update.barcode)
        .bind(update.is_active)
        .bind(update.is_featured)
        .bind(update.is_digital)
        .bind(update.weight)
        .bind(&update.dimensions)
        .bind(&update.tags)
        .bind(update.category_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || format!("slug '{slug}' already exists")))?
        .ok_or(RepositoryError::NotFound)?;

        if let Some(url) = update.image_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            upsert_primary_image(&mut *tx, id, url, &product.name).await?;
        }

        tx.commit().await?;
        tracing::info!(product_id = %id, "Updated product");
        Ok(product)
    }
}

/// Set the position-0 image: update it if present, insert it otherwise.
async fn upsert_primary_image<'e, E>(
    executor: E,
    product_id: ProductId,
    image_url: &str,
    alt_text: &str,
) -> Result<(), RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r"
        INSERT INTO product_images (product_id, image_url, alt_text, position)
        VALUES ($1, $2, $3, 0)
        ON CONFLICT (product_id, position)
        DO UPDATE SET image_url = EXCLUDED.image_url, alt_text = EXCLUDED.alt_text
        ",
    )
    .bind(product_id)
    .bind(image_url)
    .bind(alt_text)
    .execute(executor)
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn update(name: &str) -> ProductUpdate {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "price": "149.90",
            "compare_price": null,
            "stock_quantity": 4,
            "is_active": true,
            "weight": null,
            "dimensions": null,
            "tags": ["ahşap"],
            "category_id": null,
            "image_url": null
        }))
        .unwrap()
    }

    #[test]
    fn test_update_regenerates_slug() {
        assert_eq!(
            update("Ahşap Kaşık Seti").validated_slug().unwrap(),
            "ahsap-kasik-seti"
        );
    }

    #[test]
    fn test_update_defaults_optional_text() {
        let u = update("Kaşık");
        assert_eq!(u.description, "");
        assert!(!u.is_featured);
        assert_eq!(u.price, Decimal::new(14990, 2));
    }

    #[test]
    fn test_update_rejections() {
        assert_eq!(
            update("!!!").validated_slug(),
            Err(UpdateRejection::EmptySlug)
        );

        let mut negative = update("Kaşık");
        negative.stock_quantity = -1;
        assert_eq!(
            negative.validated_slug(),
            Err(UpdateRejection::NegativeStock)
        );

        let mut cheap = update("Kaşık");
        cheap.price = Decimal::new(-1, 0);
        assert_eq!(cheap.validated_slug(), Err(UpdateRejection::NegativePrice));
    }
}
