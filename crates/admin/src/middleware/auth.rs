//! Bearer-token authentication for admin API routes.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;

use crate::state::AppState;

/// Extractor that requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_auth: RequireApiToken) -> impl IntoResponse {
///     "ok"
/// }
/// ```
pub struct RequireApiToken;

/// Error returned when the API token is missing or wrong.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiTokenRejection {
    /// No bearer token in the request.
    Missing,
    /// A token was sent but does not match.
    Invalid,
}

impl IntoResponse for ApiTokenRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "Missing bearer token",
            Self::Invalid => "Invalid bearer token",
        };
        (
            StatusCode::UNAUTHORIZED,
            [("www-authenticate", "Bearer")],
            message,
        )
            .into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    given
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Check a request's headers against the expected token.
///
/// # Errors
///
/// Returns the rejection to send back when the token is missing or wrong.
pub fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<(), ApiTokenRejection> {
    let token = bearer_token(headers).ok_or(ApiTokenRejection::Missing)?;
    if tokens_match(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        tracing::warn!("Rejected admin API request with invalid token");
        Err(ApiTokenRejection::Invalid)
    }
}

impl FromRequestParts<AppState> for RequireApiToken {
    type Rejection = ApiTokenRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_bearer(&parts.headers, state.config().api_token.expose_secret())?;
        Ok(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6v";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token_accepted() {
        assert_eq!(check_bearer(&headers(&format!("Bearer {TOKEN}")), TOKEN), Ok(()));
        assert_eq!(check_bearer(&headers(&format!("bearer {TOKEN}")), TOKEN), Ok(()));
    }

    #[test]
    fn test_missing_token_rejected() {
        assert_eq!(
            check_bearer(&HeaderMap::new(), TOKEN),
            Err(ApiTokenRejection::Missing)
        );
        assert_eq!(
            check_bearer(&headers(&format!("Basic {TOKEN}")), TOKEN),
            Err(ApiTokenRejection::Missing)
        );
        assert_eq!(
            check_bearer(&headers("Bearer "), TOKEN),
            Err(ApiTokenRejection::Missing)
        );
    }

    #[test]
    fn test_wrong_token_rejected() {
        assert_eq!(
            check_bearer(&headers("Bearer nope"), TOKEN),
            Err(ApiTokenRejection::Invalid)
        );
        let almost = format!("Bearer {}x", &TOKEN[..TOKEN.len() - 1]);
        assert_eq!(
            check_bearer(&headers(&almost), TOKEN),
            Err(ApiTokenRejection::Invalid)
        );
    }

    #[test]
    fn test_rejection_is_unauthorized() {
        let response = ApiTokenRejection::Invalid.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["www-authenticate"], "Bearer");
    }
}
