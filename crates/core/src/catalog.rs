//! Catalog records shared by the storefront and the admin panel.
//!
//! The storefront only reads these; the admin panel creates them through the
//! bulk import and edits them one at a time.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Price, ProductId, ProductImageId};

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub description: String,
    pub short_description: String,
    pub stock_quantity: i32,
    pub sku: String,
    pub barcode: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_digital: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Percentage saved against the compare-at price, rounded to the nearest
    /// whole percent.
    ///
    /// Returns 0 when there is no compare price (or it is not positive).
    #[must_use]
    pub fn discount_percent(&self) -> i64 {
        discount_percent(self.price, self.compare_price)
    }

    /// Stock as a cart ceiling (negative stock counts as none).
    #[must_use]
    pub fn stock_ceiling(&self) -> u32 {
        u32::try_from(self.stock_quantity).unwrap_or(0)
    }

    /// Whether the product can be added to a cart at all.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Price in the store currency.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::lira(self.price)
    }
}

/// Compute `round((compare - price) / compare * 100)`.
#[must_use]
pub fn discount_percent(price: Decimal, compare_price: Option<Decimal>) -> i64 {
    let Some(compare) = compare_price.filter(|c| c.is_sign_positive() && !c.is_zero()) else {
        return 0;
    };

    let percent = ((compare - price) / compare * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    percent.to_i64().unwrap_or(0)
}

/// A product ready to be inserted (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub description: String,
    pub short_description: String,
    pub stock_quantity: i32,
    pub sku: String,
    pub barcode: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_digital: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product image. Position 0 is the primary image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_percent_rounds() {
        // (150 - 100) / 150 = 33.33%
        assert_eq!(
            discount_percent(Decimal::from(100), Some(Decimal::from(150))),
            33
        );
        // (80 - 79.5) / 80 = 0.625% -> 1
        assert_eq!(
            discount_percent(Decimal::new(795, 1), Some(Decimal::from(80))),
            1
        );
    }

    #[test]
    fn test_discount_percent_without_compare_price() {
        assert_eq!(discount_percent(Decimal::from(100), None), 0);
        assert_eq!(discount_percent(Decimal::from(100), Some(Decimal::ZERO)), 0);
    }

    #[test]
    fn test_discount_percent_can_be_negative() {
        // Compare price below the sale price is shown as-is by callers that care
        assert_eq!(
            discount_percent(Decimal::from(120), Some(Decimal::from(100))),
            -20
        );
    }
}
