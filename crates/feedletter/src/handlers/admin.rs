//! Bearer token guard for admin endpoints.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// Proof that the request may use admin endpoints.
///
/// Requires `Authorization: Bearer <ADMIN_TOKEN>` when a token is
/// configured; every request passes when it is not.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

/// Rejection for a missing or wrong admin token (401).
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [("www-authenticate", "Bearer")],
            "Missing or invalid admin token",
        )
            .into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = Unauthorized;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_token.as_deref() else {
            return Ok(AdminAuth);
        };

        match bearer_token(&parts.headers) {
            Some(token) if token == expected => Ok(AdminAuth),
            _ => {
                tracing::warn!(path = %parts.uri.path(), "Admin request rejected");
                Err(Unauthorized)
            }
        }
    }
}
