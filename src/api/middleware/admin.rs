//! Admin gate for `/admin/*` routes.
//!
//! Compares `X-Admin-Password` against the configured password in
//! constant time. `/admin/auth` is mounted outside this layer.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";

/// Constant-time comparison of a supplied password with the expected one.
pub fn password_matches(supplied: &str, expected: &str) -> bool {
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Reject the request unless it carries the admin password.
/// Accesses `ApiContext` from request extensions.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_admin_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_admin_inner(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let supplied = req
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Admin password required".into()))?;

    if !password_matches(supplied, ctx.core.admin_password()) {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request");
        return Err(ApiError::Unauthorized("Invalid admin password".into()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_comparison() {
        assert!(password_matches("admin123", "admin123"));
        assert!(!password_matches("admin12", "admin123"));
        assert!(!password_matches("", "admin123"));
        assert!(!password_matches("ADMIN123", "admin123"));
    }
}
