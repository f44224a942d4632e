//! Resolves the `Authorization` header into a [`Principal`].
//!
//! Tokens are issued by the authentication backend and stored in
//! `auth_tokens`; this extractor only looks them up. A request with no header
//! is anonymous. A malformed header or an unknown token is rejected.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use sqlx::FromRow;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::permissions::Principal;
use crate::state::AppState;

const TOKEN_SCHEMES: &[&str] = &["Token", "Bearer"];

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: Uuid,
    is_active: bool,
    is_verified: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Principal {
            id: Some(row.id),
            authenticated: true,
            verified: row.is_verified,
            active: row.is_active,
            staff: row.is_staff,
            superuser: row.is_superuser,
        }
    }
}

/// Pulls the token key out of `Authorization: Token <key>` (or `Bearer`).
/// The scheme is matched case-insensitively. `Ok(None)` means the header is
/// absent.
pub fn token_from_headers(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(key), None)
            if TOKEN_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) =>
        {
            Ok(Some(key))
        }
        _ => Err(AppError::Unauthorized),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let Some(key) = token_from_headers(&parts.headers)? else {
            return Ok(Principal::anonymous());
        };

        let row: Option<PrincipalRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.is_active, u.is_verified, u.is_staff, u.is_superuser
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&state.db)
        .await?;

        match row {
            Some(row) => {
                debug!("Resolved token to user {}", row.id);
                Ok(row.into())
            }
            None => {
                debug!("Rejected unknown token");
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert_eq!(token_from_headers(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_token_scheme() {
        assert_eq!(token_from_headers(&headers("Token abc123")).unwrap(), Some("abc123"));
    }

    #[test]
    fn test_bearer_scheme() {
        assert_eq!(token_from_headers(&headers("Bearer abc123")).unwrap(), Some("abc123"));
    }

    #[test]
    fn test_scheme_case_insensitive() {
        assert_eq!(token_from_headers(&headers("token abc123")).unwrap(), Some("abc123"));
        assert_eq!(token_from_headers(&headers("BEARER abc123")).unwrap(), Some("abc123"));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        assert!(matches!(
            token_from_headers(&headers("Basic dXNlcjpwYXNz")),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(token_from_headers(&headers("Token")).is_err());
    }

    #[test]
    fn test_extra_parts_rejected() {
        assert!(token_from_headers(&headers("Token abc def")).is_err());
    }
}
