//! Bulk import commands.
//!
//! Runs the same import routine as the admin upload endpoint, against the
//! database named by `ADMIN_DATABASE_URL` (or `DATABASE_URL`).

use std::path::Path;

use carsi_admin::config::{ConfigError, ImportConfig, get_database_url};
use carsi_admin::db::{PgCatalog, create_pool};
use carsi_admin::import::{ImportError, ImportReport, Importer, feed, row::SourceRow, sheet};
use thiserror::Error;

/// Errors that stop an import before any row is processed.
#[derive(Debug, Error)]
pub enum ImportCommandError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Import(#[from] ImportError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

fn import_config(max_rows: Option<usize>) -> Result<ImportConfig, ConfigError> {
    let mut config = ImportConfig::from_env()?;
    if let Some(max_rows) = max_rows.filter(|n| *n > 0) {
        config.max_rows = max_rows;
    }
    Ok(config)
}

async fn import_rows(
    rows: Vec<SourceRow>,
    config: ImportConfig,
) -> Result<ImportReport, ImportCommandError> {
    let database_url = get_database_url("ADMIN_DATABASE_URL")?;
    let catalog = PgCatalog::new(create_pool(&database_url).await?);

    Ok(Importer::new(&catalog, config.max_rows).run(rows).await)
}

/// Import a workbook from disk.
///
/// # Errors
///
/// Returns `ImportCommandError` if the file cannot be read or is not a
/// workbook, or the database is unreachable.
pub async fn xlsx(
    path: &Path,
    max_rows: Option<usize>,
) -> Result<ImportReport, ImportCommandError> {
    let config = import_config(max_rows)?;
    let file_name = path.display().to_string();
    if !sheet::is_workbook_name(&file_name) {
        return Err(ImportError::UnsupportedFile(file_name).into());
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ImportCommandError::Read {
            path: file_name.clone(),
            source,
        })?;
    let rows = sheet::read_workbook(bytes)?;
    tracing::info!(file = %file_name, rows = rows.len(), "Workbook read");

    import_rows(rows, config).await
}

/// Download and import an XML feed.
///
/// # Errors
///
/// Returns `ImportCommandError` if the URL is not `http(s)`, the download
/// fails, the XML is malformed, or the database is unreachable.
pub async fn feed(url: &str, max_rows: Option<usize>) -> Result<ImportReport, ImportCommandError> {
    let config = import_config(max_rows)?;
    let url = feed::parse_feed_url(url)?;

    let client = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(concat!("carsi-cli/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let xml = feed::fetch_feed(&client, &url, config.max_feed_bytes).await?;
    let rows = feed::parse_feed(&xml)?;
    tracing::info!(%url, rows = rows.len(), "Feed read");

    import_rows(rows, config).await
}

/// Print the run summary and each failed row.
#[allow(clippy::print_stdout)]
pub fn print_report(report: &ImportReport) {
    println!("{}", report.summary());
    for failure in &report.errors {
        println!("  satır {}: {}", failure.row, failure.message);
    }
}
