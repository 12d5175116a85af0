//! Cart store.
//!
//! A [`Cart`] is an ordered list of [`CartItem`] lines, unique by product id.
//! Every line satisfies `1 <= quantity <= stock`; mutations that would break
//! this are rejected and leave the cart untouched.
//!
//! Each mutation reports a [`CartOutcome`] which maps to the notification a
//! shopper sees ([`CartOutcome::notice`]). Persistence is the caller's job:
//! take a [`CartSnapshot`] after every mutation and restore it with
//! [`Cart::from_snapshot`] on the next visit.
//!
//! ```rust
//! use carsi_core::cart::{Cart, CartOutcome, NewCartItem};
//! use carsi_core::ProductId;
//! use rust_decimal::Decimal;
//!
//! let mut cart = Cart::new();
//! let mug = NewCartItem {
//!     id: ProductId::random(),
//!     name: "Kupa".to_string(),
//!     price: Decimal::new(12_50, 2),
//!     image_url: None,
//!     stock: 3,
//!     slug: "kupa".to_string(),
//! };
//!
//! assert!(matches!(cart.add_item(mug.clone(), 2), CartOutcome::Added { .. }));
//! assert_eq!(cart.add_item(mug, 2), CartOutcome::InsufficientStock);
//! assert_eq!(cart.total_items(), 2);
//! assert_eq!(cart.total_price(), Decimal::from(25));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::shipping::shipping_fee;
use crate::types::ProductId;

/// Fixed storage name for the persisted cart snapshot.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 0;

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
    /// Stock ceiling: the most of this item the cart may hold.
    pub stock: u32,
    pub slug: String,
}

impl CartItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An item offered to the cart, before a quantity is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    pub stock: u32,
    pub slug: String,
}

impl NewCartItem {
    /// Build a cart offer from the current product row.
    #[must_use]
    pub fn from_product(product: &Product, image_url: Option<String>) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url,
            stock: product.stock_ceiling(),
            slug: product.slug.clone(),
        }
    }

    /// Turn the offer into a cart line holding `quantity`.
    #[must_use]
    pub fn into_line(self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id,
            name: self.name,
            price: self.price,
            image_url: self.image_url,
            quantity,
            stock: self.stock,
            slug: self.slug,
        }
    }
}

/// Result of a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartOutcome {
    /// A new line was appended.
    Added { name: String },
    /// An existing line's quantity was increased.
    Increased { name: String },
    /// A line's quantity was overwritten.
    QuantitySet,
    /// A line was removed (or was already absent).
    Removed,
    /// Every line was removed.
    Cleared,
    /// Adding would exceed the stock ceiling; nothing changed.
    InsufficientStock,
    /// The requested quantity is above the stock ceiling; nothing changed.
    ExceedsStock,
    /// The request was invalid or targeted a missing line; nothing changed.
    Ignored,
}

impl CartOutcome {
    /// Whether the cart was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        !matches!(
            self,
            Self::InsufficientStock | Self::ExceedsStock | Self::Ignored
        )
    }

    /// The notification to show the shopper, if any.
    #[must_use]
    pub fn notice(&self) -> Option<CartNotice> {
        match self {
            Self::Added { name } => Some(CartNotice::info(
                "Sepete Eklendi",
                format!("{name} sepetinize eklendi."),
            )),
            Self::Increased { name } => Some(CartNotice::info(
                "Miktar Güncellendi",
                format!("{name} sepetinizde güncellendi."),
            )),
            Self::Removed => Some(CartNotice::info(
                "Ürün Kaldırıldı",
                "Ürün sepetinizden kaldırıldı.",
            )),
            Self::InsufficientStock => Some(CartNotice::destructive(
                "Stok Yetersiz",
                "Bu üründen daha fazla ekleyemezsiniz.",
            )),
            Self::ExceedsStock => Some(CartNotice::destructive(
                "Stok Yetersiz",
                "Bu kadar stok bulunmuyor.",
            )),
            Self::QuantitySet | Self::Cleared | Self::Ignored => None,
        }
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartNotice {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl CartNotice {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            destructive: false,
        }
    }

    fn destructive(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            destructive: true,
        }
    }
}

/// Cart totals for display and checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Error restoring a cart from a serialized snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported cart snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Persisted form of a cart: `{"state":{"items":[...]},"version":0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub state: CartState,
    pub version: u32,
}

/// Snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartItem>,
}

/// The cart store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of an item (0 counts as 1).
    ///
    /// An existing line grows by `quantity`; a new line is appended. Either
    /// way the resulting quantity must fit under the offered item's stock,
    /// otherwise nothing changes and [`CartOutcome::InsufficientStock`] is
    /// returned. The offered stock replaces the line's stored ceiling.
    pub fn add_item(&mut self, item: NewCartItem, quantity: u32) -> CartOutcome {
        let quantity = quantity.max(1);

        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            let Some(new_quantity) = existing.quantity.checked_add(quantity) else {
                return CartOutcome::InsufficientStock;
            };
            if new_quantity > item.stock {
                return CartOutcome::InsufficientStock;
            }

            existing.quantity = new_quantity;
            existing.stock = item.stock;
            return CartOutcome::Increased { name: item.name };
        }

        if quantity > item.stock {
            return CartOutcome::InsufficientStock;
        }

        let name = item.name.clone();
        self.items.push(item.into_line(quantity));
        CartOutcome::Added { name }
    }

    /// Delete a line unconditionally.
    pub fn remove_item(&mut self, id: ProductId) -> CartOutcome {
        self.items.retain(|i| i.id != id);
        CartOutcome::Removed
    }

    /// Overwrite a line's quantity.
    ///
    /// Requests below 1 and unknown ids are ignored; requests above the
    /// line's stock ceiling are rejected with [`CartOutcome::ExceedsStock`].
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) -> CartOutcome {
        if quantity < 1 {
            return CartOutcome::Ignored;
        }

        let Some(line) = self.items.iter_mut().find(|i| i.id == id) else {
            return CartOutcome::Ignored;
        };

        match u32::try_from(quantity) {
            Ok(q) if q <= line.stock => {
                line.quantity = q;
                CartOutcome::QuantitySet
            }
            _ => CartOutcome::ExceedsStock,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> CartOutcome {
        self.items.clear();
        CartOutcome::Cleared
    }

    /// Fold another cart's lines into this one.
    ///
    /// Unlike [`Cart::add_item`], merging never rejects: summed quantities
    /// saturate at the incoming line's stock ceiling, and lines whose stock
    /// has dropped to zero are removed.
    pub fn merge(&mut self, other: Self) {
        for incoming in other.items {
            if let Some(pos) = self.items.iter().position(|i| i.id == incoming.id) {
                let ceiling = incoming.stock;
                if ceiling == 0 {
                    self.items.remove(pos);
                    continue;
                }
                if let Some(existing) = self.items.get_mut(pos) {
                    existing.quantity = existing
                        .quantity
                        .saturating_add(incoming.quantity)
                        .min(ceiling);
                    existing.stock = ceiling;
                }
            } else if incoming.stock > 0 {
                let quantity = incoming.quantity.clamp(1, incoming.stock);
                self.items.push(CartItem {
                    quantity,
                    ..incoming
                });
            }
        }
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, i| total.saturating_add(i.quantity))
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Totals including the shipping fee.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let subtotal = self.total_price();
        let shipping = shipping_fee(subtotal);
        CartSummary {
            item_count: self.total_items(),
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Capture the persisted form of this cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            state: CartState {
                items: self.items.clone(),
            },
            version: SNAPSHOT_VERSION,
        }
    }

    /// Restore a cart from a snapshot.
    ///
    /// Snapshots come from storage the user can outlive, so lines are
    /// repaired rather than trusted: zero-stock lines are dropped, quantities
    /// are clamped into `1..=stock`, and duplicate ids keep their first line.
    #[must_use]
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        let mut items: Vec<CartItem> = Vec::with_capacity(snapshot.state.items.len());
        for mut line in snapshot.state.items {
            if line.stock == 0 || items.iter().any(|i| i.id == line.id) {
                continue;
            }
            line.quantity = line.quantity.clamp(1, line.stock);
            items.push(line);
        }
        Self { items }
    }

    /// Serialize the snapshot to JSON.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    /// Restore a cart from snapshot JSON.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the JSON is malformed or has an unknown version.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: CartSnapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(Self::from_snapshot(snapshot))
    }
}
