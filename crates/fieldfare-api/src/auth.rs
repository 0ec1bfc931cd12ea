//! Caller-scope extraction for protected endpoints.
//!
//! The fronting authenticator resolves the caller's department scope and
//! forwards it in the `x-access-scope` header. The middleware rejects
//! requests without it and exposes the value to handlers as a
//! [`CallerScope`] request extension.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Header carrying the caller's resolved access scope.
pub const SCOPE_HEADER: &str = "x-access-scope";

/// The caller's access scope, applied as the search term filter.
#[derive(Debug, Clone)]
pub struct CallerScope(pub String);

/// Middleware that requires the scope header on protected endpoints.
///
/// Returns 401 if the header is missing, unreadable, or blank. Otherwise
/// inserts [`CallerScope`] into the request extensions and continues.
pub async fn require_scope(mut req: Request, next: Next) -> Response {
    let scope = match req.headers().get(SCOPE_HEADER) {
        Some(value) => match value.to_str() {
            Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
            Ok(_) => return unauthorized("x-access-scope header must not be empty"),
            Err(_) => return unauthorized("Invalid x-access-scope header encoding"),
        },
        None => return unauthorized("Missing x-access-scope header"),
    };

    req.extensions_mut().insert(CallerScope(scope));
    next.run(req).await
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
