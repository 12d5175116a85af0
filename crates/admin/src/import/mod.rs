//! Bulk product import.
//!
//! Rows come from an uploaded workbook ([`sheet`]) or an XML feed ([`feed`]),
//! are normalized by [`row::ProductDraft`], and are written one at a time
//! through a [`CatalogSink`]. A bad row is counted and reported; it never
//! aborts the run.

pub mod feed;
pub mod row;
pub mod sheet;

use std::collections::HashMap;
use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use carsi_core::catalog::{Category, NewProduct, Product};
use carsi_core::slug::slugify;
use carsi_core::CategoryId;

use row::{ProductDraft, SourceRow};

/// Default ceiling on rows processed per run.
pub const DEFAULT_MAX_IMPORT_ROWS: usize = 500;

/// Errors that stop an import before any row is written.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheet or header row")]
    EmptyWorkbook,

    #[error("could not parse feed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("could not fetch feed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("feed returned HTTP {0}")]
    FetchStatus(u16),

    #[error("feed is larger than {0} bytes")]
    FeedTooLarge(usize),

    #[error("feed is not valid UTF-8")]
    FeedEncoding,

    #[error("invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),
}

/// Why a single row was not imported.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("missing product name")]
    MissingName,

    #[error("product name '{0}' has no letters or digits")]
    EmptySlug(String),

    #[error("write failed: {0}")]
    Write(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Where imported products are written.
///
/// Implemented over Postgres by [`crate::db::PgCatalog`]; tests use an
/// in-memory sink.
pub trait CatalogSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send;

    /// Create a category, or return the existing one with the same slug.
    fn create_category(
        &self,
        name: &str,
        slug: &str,
    ) -> impl Future<Output = Result<Category, Self::Error>> + Send;

    /// Insert a product together with its position-0 image, if any.
    ///
    /// All or nothing: when the image cannot be written the product must not
    /// be stored either.
    fn insert_product(
        &self,
        product: &NewProduct,
        image_url: Option<&str>,
    ) -> impl Future<Output = Result<Product, Self::Error>> + Send;
}

/// A row that failed, numbered from 1 in source order.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub success_count: usize,
    pub error_count: usize,
    /// Rows beyond the ceiling that were not looked at.
    pub skipped: usize,
    pub errors: Vec<RowFailure>,
}

impl ImportReport {
    /// Human-readable summary shown to the operator.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut message = format!("{} ürün başarıyla yüklendi.", self.success_count);
        if self.error_count > 0 {
            message.push_str(&format!(" {} ürün yüklenemedi.", self.error_count));
        }
        if self.skipped > 0 {
            message.push_str(&format!(
                " {} satır satır sınırını aştığı için atlandı.",
                self.skipped
            ));
        }
        message
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.success_count + self.error_count + self.skipped
    }
}

/// Runs rows through normalization and into a sink.
pub struct Importer<'a, S> {
    sink: &'a S,
    max_rows: usize,
    categories: HashMap<String, CategoryId>,
}

impl<'a, S: CatalogSink + Sync> Importer<'a, S> {
    #[must_use]
    pub fn new(sink: &'a S, max_rows: usize) -> Self {
        Self {
            sink,
            max_rows,
            categories: HashMap::new(),
        }
    }

    /// Import `rows` in order.
    ///
    /// Rows past the ceiling are counted as skipped. Each row is independent:
    /// an earlier failure never changes what a later row does.
    #[tracing::instrument(skip_all, fields(rows = rows.len(), max_rows = self.max_rows))]
    pub async fn run(mut self, rows: Vec<SourceRow>) -> ImportReport {
        let mut report = ImportReport {
            skipped: rows.len().saturating_sub(self.max_rows),
            ..ImportReport::default()
        };

        for (index, source) in rows.iter().take(self.max_rows).enumerate() {
            let row = index + 1;
            match self.import_row(source).await {
                Ok(product) => {
                    tracing::debug!(row, slug = %product.slug, "Imported product");
                    report.success_count += 1;
                }
                Err(e) => {
                    tracing::warn!(row, error = %e, "Skipping import row");
                    report.error_count += 1;
                    report.errors.push(RowFailure {
                        row,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            success = report.success_count,
            failed = report.error_count,
            skipped = report.skipped,
            "Import finished"
        );
        report
    }

    async fn import_row(&mut self, source: &SourceRow) -> Result<Product, RowError> {
        let ProductDraft {
            mut product,
            category,
            image_url,
        } = ProductDraft::from_row(source)?;

        if let Some(name) = category {
            product.category_id = self.resolve_category(&name).await?;
        }

        self.sink
            .insert_product(&product, image_url.as_deref())
            .await
            .map_err(write_err)
    }

    async fn resolve_category(&mut self, name: &str) -> Result<Option<CategoryId>, RowError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Ok(None);
        }
        if let Some(id) = self.categories.get(&slug) {
            return Ok(Some(*id));
        }

        let category = match self
            .sink
            .find_category_by_slug(&slug)
            .await
            .map_err(write_err)?
        {
            Some(existing) => existing,
            None => self
                .sink
                .create_category(name, &slug)
                .await
                .map_err(write_err)?,
        };

        self.categories.insert(slug, category.id);
        Ok(Some(category.id))
    }
}

fn write_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> RowError {
    RowError::Write(Box::new(e))
}
