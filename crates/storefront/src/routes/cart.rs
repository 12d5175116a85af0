//! Cart and checkout route handlers.
//!
//! Each handler loads the cart from the session, applies one operation and
//! writes it back only if it changed. Stock rejections are not errors: they
//! come back as a destructive `notice` with the unchanged cart.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use carsi_core::ProductId;
use carsi_core::cart::{
    Cart, CartItem, CartNotice, CartOutcome, CartSnapshot, CartState, CartSummary, NewCartItem,
    SNAPSHOT_VERSION,
};

use crate::cart::{load_cart, save_cart};
use crate::error::{AppError, add_breadcrumb};
use crate::state::AppState;

/// Cart contents returned by every cart route.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: CartView,
    pub summary: CartSummary,
    pub notice: Option<CartNotice>,
}

/// Cart lines.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
}

impl CartResponse {
    fn new(cart: &Cart, notice: Option<CartNotice>) -> Self {
        Self {
            cart: CartView {
                items: cart.items().to_vec(),
            },
            summary: cart.summary(),
            notice,
        }
    }
}

/// `POST /api/cart/items` body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Most lines accepted in one merge request.
pub const MAX_MERGE_LINES: usize = 100;

/// `PUT /api/cart/items/{id}` body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// `GET /api/cart/count` response.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// A cart line that can no longer be fulfilled.
#[derive(Debug, Serialize)]
pub struct CheckoutIssue {
    pub product_id: ProductId,
    pub name: String,
    pub requested: u32,
    pub available: u32,
}

/// Checkout validation result.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub valid: bool,
    pub summary: CartSummary,
    pub issues: Vec<CheckoutIssue>,
}

async fn apply(
    session: &Session,
    cart: &Cart,
    outcome: &CartOutcome,
) -> Result<Json<CartResponse>, AppError> {
    if outcome.changed() {
        save_cart(session, cart).await?;
    }
    Ok(Json(CartResponse::new(cart, outcome.notice())))
}

/// Show the cart and its totals.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[tracing::instrument(skip_all)]
pub async fn show(session: Session) -> Result<Json<CartResponse>, AppError> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartResponse::new(&cart, None)))
}

/// Total quantity across all lines, for the header badge.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[tracing::instrument(skip_all)]
pub async fn count(session: Session) -> Result<Json<CartCount>, AppError> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.total_items(),
    }))
}

/// Add a product to the cart.
///
/// The line is built from the current product row, so price and stock
/// ceiling come from the database rather than the client.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product does not exist or is inactive.
#[tracing::instrument(skip(state, session))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let product = state
        .products()
        .get_by_id(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let mut cart = load_cart(&session).await?;
    let offer = NewCartItem::from_product(&product.product, product.image_url);
    let outcome = cart.add_item(offer, request.quantity);

    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Add to cart", Some(&[("product_id", product_id.as_str())]));
    tracing::info!(product_id = %request.product_id, changed = outcome.changed(), "Cart add");

    apply(&session, &cart, &outcome).await
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[tracing::instrument(skip(session))]
pub async fn update_item(
    session: Session,
    Path(id): Path<ProductId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let mut cart = load_cart(&session).await?;
    let outcome = cart.update_quantity(id, request.quantity);
    apply(&session, &cart, &outcome).await
}

/// Remove a line.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[tracing::instrument(skip(session))]
pub async fn remove_item(
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<CartResponse>, AppError> {
    let mut cart = load_cart(&session).await?;
    let outcome = cart.remove_item(id);
    apply(&session, &cart, &outcome).await
}

/// Empty the cart.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[tracing::instrument(skip_all)]
pub async fn clear(session: Session) -> Result<Json<CartResponse>, AppError> {
    let mut cart = load_cart(&session).await?;
    let outcome = cart.clear();
    apply(&session, &cart, &outcome).await
}

/// Fold a cart snapshot kept by the client into the session cart.
///
/// Only product ids and quantities are taken from the snapshot. Each line is
/// rebuilt from the current product row; unknown or inactive products are
/// dropped. Quantities saturate at the stock ceiling instead of being
/// rejected.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown snapshot version or more
/// than [`MAX_MERGE_LINES`] lines.
#[tracing::instrument(skip_all, fields(lines = snapshot.state.items.len()))]
pub async fn merge(
    State(state): State<AppState>,
    session: Session,
    Json(snapshot): Json<CartSnapshot>,
) -> Result<Json<CartResponse>, AppError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(AppError::BadRequest(format!(
            "unsupported cart snapshot version {}",
            snapshot.version
        )));
    }
    if snapshot.state.items.len() > MAX_MERGE_LINES {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_MERGE_LINES} cart lines can be merged"
        )));
    }

    let repo = state.products();
    let mut lines = Vec::with_capacity(snapshot.state.items.len());
    for line in snapshot.state.items {
        if let Some(current) = repo.get_by_id(line.id).await? {
            let offer = NewCartItem::from_product(&current.product, current.image_url);
            lines.push(offer.into_line(line.quantity));
        }
    }
    let stored = Cart::from_snapshot(CartSnapshot {
        state: CartState { items: lines },
        version: SNAPSHOT_VERSION,
    });

    let mut cart = load_cart(&session).await?;
    let before = cart.clone();
    cart.merge(stored);

    if cart != before {
        save_cart(&session, &cart).await?;
    }
    tracing::info!(items = cart.total_items(), "Cart merged");

    Ok(Json(CartResponse::new(&cart, None)))
}

/// Check every line against current stock and return the totals.
///
/// Responds `409 Conflict` listing the lines that can no longer be filled.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty cart.
#[tracing::instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Sepetiniz boş".to_string()));
    }

    let repo = state.products();
    let mut issues = Vec::new();
    for line in cart.items() {
        let available = repo
            .get_by_id(line.id)
            .await?
            .map_or(0, |p| p.product.stock_ceiling());
        if line.quantity > available {
            issues.push(CheckoutIssue {
                product_id: line.id,
                name: line.name.clone(),
                requested: line.quantity,
                available,
            });
        }
    }

    let valid = issues.is_empty();
    if !valid {
        tracing::warn!(issues = issues.len(), "Checkout blocked by stock changes");
    }

    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    let body = CheckoutResponse {
        valid,
        summary: cart.summary(),
        issues,
    };

    Ok((status, Json(body)).into_response())
}
