//! Route guard for protected admin routes
//!
//! Every guarded request resolves its bearer token against the session
//! store before the handler runs; nothing protected is served while the
//! check is pending or after it fails.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::server::SharedState;
use crate::auth::models::RoleKind;

const LOGIN_PATH: &str = "/api/auth/login";

/// The raw token a guarded request authenticated with, available to
/// handlers as an extension
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Pull the bearer token from the Authorization header or session cookie
pub fn extract_token(req: &Request) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = req.headers().get("Cookie") {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("klinik_token=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Middleware requiring a live session; resolves the account into request
/// extensions for the handler
pub async fn require_auth(state: State<SharedState>, req: Request, next: Next) -> Response {
    guard(state, req, next, None).await
}

/// Middleware requiring a live session with the admin role
pub async fn require_admin(state: State<SharedState>, req: Request, next: Next) -> Response {
    guard(state, req, next, Some(RoleKind::Admin)).await
}

async fn guard(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
    required_role: Option<RoleKind>,
) -> Response {
    let requested = req.uri().path().to_string();

    let Some(token) = extract_token(&req) else {
        return denied(&requested);
    };

    let account = match state.auth.resolve_token(&token).await {
        Ok(Some(account)) => account,
        Ok(None) => return denied(&requested),
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Could not verify session, please try again",
                })),
            )
                .into_response();
        }
    };

    if let Some(required) = required_role {
        if account.role.kind() != required {
            return denied(&requested);
        }
    }

    req.extensions_mut().insert(account);
    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}

/// 401 with the login entry point and the originally requested path, so the
/// client can come back after signing in
fn denied(requested: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "success": false,
            "error": "Not signed in",
            "login": format!("{}?next={}", LOGIN_PATH, requested),
        })),
    )
        .into_response()
}
