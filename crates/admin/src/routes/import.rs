//! Bulk import route handlers.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::import::{ImportError, ImportReport, Importer, feed, row::SourceRow, sheet};
use crate::middleware::RequireApiToken;
use crate::state::AppState;

/// Multipart field carrying the workbook.
pub const FILE_FIELD: &str = "file";

/// Import result returned to the operator.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub report: ImportReport,
    pub message: String,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        let message = report.summary();
        Self { report, message }
    }
}

/// Feed import request body.
#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    pub url: String,
}

async fn run_import(state: &AppState, rows: Vec<SourceRow>) -> ImportResponse {
    let catalog = state.catalog();
    Importer::new(&catalog, state.config().import.max_rows)
        .run(rows)
        .await
        .into()
}

/// Import products from an uploaded workbook.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the upload has no `file` field, and
/// `AppError::Import` if the file is not a readable workbook.
#[tracing::instrument(skip_all)]
pub async fn upload(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::BadRequest(format!("missing `{FILE_FIELD}` field")))?;
    if !sheet::is_workbook_name(&file_name) {
        return Err(ImportError::UnsupportedFile(file_name).into());
    }

    tracing::info!(file_name = %file_name, bytes = bytes.len(), "Workbook import started");

    let rows = tokio::task::spawn_blocking(move || sheet::read_workbook(bytes.to_vec()))
        .await
        .map_err(|e| AppError::Internal(format!("workbook reader failed: {e}")))??;

    Ok(Json(run_import(&state, rows).await))
}

/// Import products from an XML feed URL.
///
/// # Errors
///
/// Returns `AppError::Import` if the URL is invalid, the download fails or
/// is too large, or the document is not well-formed XML.
#[tracing::instrument(skip_all, fields(url = %request.url))]
pub async fn feed(
    _auth: RequireApiToken,
    State(state): State<AppState>,
    Json(request): Json<FeedRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let url = feed::parse_feed_url(&request.url)?;
    let max_bytes = state.config().import.max_feed_bytes;
    let body = feed::fetch_feed(state.http(), &url, max_bytes).await?;
    let rows = feed::parse_feed(&body)?;

    tracing::info!(rows = rows.len(), "Feed import started");
    Ok(Json(run_import(&state, rows).await))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::import::RowFailure;

    #[test]
    fn test_import_response_flattens_report() {
        let report = ImportReport {
            success_count: 2,
            error_count: 1,
            skipped: 0,
            errors: vec![RowFailure {
                row: 2,
                message: "missing product name".to_string(),
            }],
        };

        let json = serde_json::to_value(ImportResponse::from(report)).unwrap();

        assert_eq!(json["success_count"], 2);
        assert_eq!(json["error_count"], 1);
        assert_eq!(json["errors"][0]["row"], 2);
        assert_eq!(
            json["message"],
            "2 ürün başarıyla yüklendi. 1 ürün yüklenemedi."
        );
    }
}
