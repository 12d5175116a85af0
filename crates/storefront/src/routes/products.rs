//! Catalog route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::db::{ProductDetail, ProductSummary};
use crate::error::AppError;
use crate::state::AppState;

/// Search query string.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// List active products, newest first.
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Arc<Vec<ProductSummary>>>, AppError> {
    let products = state.products().list_active().await?;
    Ok(Json(products))
}

/// Show a single active product.
///
/// # Errors
///
/// Returns `AppError::NotFound` if no active product has this slug.
#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>, AppError> {
    let product = state
        .products()
        .get_active_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    Ok(Json(product))
}

/// Search active products by name or short description.
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductSummary>>, AppError> {
    let results = state.products().search(&params.q).await?;
    Ok(Json(results))
}
