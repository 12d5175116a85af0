//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`RequireApiToken`]) on each `/api` handler.

pub mod auth;
pub mod request_id;

pub use auth::{ApiTokenRejection, RequireApiToken};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
