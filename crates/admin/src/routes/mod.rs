//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database reachable)
//!
//! # Import (bearer token)
//! POST /api/products/import         - Workbook upload, multipart field `file`
//! POST /api/products/import/feed    - XML feed import, JSON body `{url}`
//!
//! # Products (bearer token)
//! GET  /api/products/{id}           - Product and images for editing
//! PUT  /api/products/{id}           - Update product
//! GET  /api/categories              - Categories ordered by name
//! ```

pub mod import;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted workbook upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/import",
            post(import::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/products/import/feed", post(import::feed))
        .route(
            "/products/{id}",
            get(products::show).put(products::update),
        )
        .route("/categories", get(products::categories))
}

/// Create the complete router for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::{AdminConfig, ImportConfig};

    use super::*;

    const TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6v";

    fn state() -> AppState {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/carsi"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            api_token: SecretString::from(TOKEN),
            import: ImportConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/carsi")
            .unwrap();
        AppState::new(config, pool).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = crate::app(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let response = crate::app(state())
            .oneshot(Request::get("/api/categories").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_feed_rejects_non_http_url() {
        let response = crate::app(state())
            .oneshot(
                Request::post("/api/products/import/feed")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"url":"file:///etc/passwd"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("unsupported scheme"));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_workbook() {
        let body = "--sinir\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"urunler.csv\"\r\n\
            Content-Type: text/csv\r\n\r\n\
            name,price\r\nKalem,10\r\n\
            --sinir--\r\n";

        let response = crate::app(state())
            .oneshot(
                Request::post("/api/products/import")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=sinir")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("urunler.csv"));
    }

    #[tokio::test]
    async fn test_upload_requires_file_field() {
        let body = "--sinir\r\n\
            Content-Disposition: form-data; name=\"not_file\"\r\n\r\n\
            x\r\n\
            --sinir--\r\n";

        let response = crate::app(state())
            .oneshot(
                Request::post("/api/products/import")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=sinir")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
