//! Product edit route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use carsi_core::ProductId;
use carsi_core::catalog::{Category, Product, ProductImage};

use crate::db::{CategoryRepository, ProductRepository, ProductUpdate};
use crate::error::AppError;
use crate::middleware::RequireApiToken;
use crate::state::AppState;

/// Product with its images, for the edit form.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

/// Get a product for editing.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no product has this ID.
#[tracing::instrument(skip(state, _auth))]
pub async fn show(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>, AppError> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let images = repo.images(id).await?;

    Ok(Json(ProductDetail { product, images }))
}

/// Update a product.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for invalid fields, `AppError::NotFound`
/// for an unknown ID and a conflict if the new name's slug is taken.
#[tracing::instrument(skip(state, _auth, update))]
pub async fn update(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>, AppError> {
    update
        .validated_slug()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let product = ProductRepository::new(state.pool())
        .update(id, &update)
        .await?;

    Ok(Json(product))
}

/// List categories ordered by name.
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn categories(
    _auth: RequireApiToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}
