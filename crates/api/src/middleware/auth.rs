//! Authentication extractors.
//!
//! - [`CurrentUser`] - bearer token required; rejects with `403 permission denied`
//! - [`CatalogWriter`] - `CurrentUser` when catalog writes are gated, else anyone
//! - [`NotifySecret`] - shared secret on the payment webhook; rejects with `401`

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderMap, Uri, header, request::Parts},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::Span;

use executive_core::UserId;

use crate::db::UserStore;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Header the payment bridge uses to authenticate webhook calls.
pub const NOTIFY_SECRET_HEADER: &str = "x-node-notify-secret";

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull the raw token from `Authorization: Bearer <token>`, falling back to a
/// `?token=` query parameter.
#[must_use]
pub fn bearer_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = from_header {
        return Some(token.to_owned());
    }

    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller.
///
/// The token must verify and its user must still exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers, &parts.uri).ok_or_else(|| {
            tracing::debug!("Missing bearer token");
            AppError::permission_denied()
        })?;

        let claims = state.tokens().verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::permission_denied()
        })?;

        if state.store().user_by_id(claims.user_id).await?.is_none() {
            tracing::debug!(user_id = %claims.user_id, "Token for unknown user");
            return Err(AppError::permission_denied());
        }

        Span::current().record("user_id", tracing::field::display(claims.user_id));
        set_sentry_user(&claims.user_id);

        Ok(Self { id: claims.user_id })
    }
}

/// Gate for category and product writes.
///
/// Holds the caller when `CATALOG_WRITES_REQUIRE_AUTH` is on; open otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CatalogWriter(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for CatalogWriter {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !state.config().catalog_writes_require_auth {
            return Ok(Self(None));
        }
        let user = CurrentUser::from_request_parts(parts, state).await?;
        Ok(Self(Some(user)))
    }
}

/// Proof that the caller presented the webhook shared secret.
#[derive(Debug, Clone, Copy)]
pub struct NotifySecret;

impl FromRequestParts<AppState> for NotifySecret {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(NOTIFY_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let expected = state.config().notify_secret.expose_secret();
        if provided.is_empty() || !constant_time_compare(provided.as_bytes(), expected.as_bytes()) {
            tracing::warn!("Webhook call with bad notify secret");
            return Err(AppError::Unauthorized("unauthorized".to_string()));
        }

        Ok(Self)
    }
}

/// Constant-time byte comparison.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        let uri: Uri = "/api/v1/cart?token=other".parse().unwrap();
        assert_eq!(bearer_token(&headers, &uri).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_query_fallback() {
        let uri: Uri = "/api/v1/cart?token=xyz".parse().unwrap();
        assert_eq!(bearer_token(&HeaderMap::new(), &uri).as_deref(), Some("xyz"));

        let uri: Uri = "/api/v1/cart".parse().unwrap();
        assert_eq!(bearer_token(&HeaderMap::new(), &uri), None);
    }

    #[test]
    fn test_bearer_token_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(bearer_token(&headers, &uri), None);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"secret", b"secret"));
        assert!(!constant_time_compare(b"secret", b"secreT"));
        assert!(!constant_time_compare(b"secret", b"secret-longer"));
        assert!(constant_time_compare(b"", b""));
    }
}
