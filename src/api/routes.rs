//! API route handlers

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::server::SharedState;
use crate::auth::middleware::{extract_token, BearerToken};
use crate::auth::models::{Account, AccountInfo, LoginRequest, LoginResponse, Role, RoleKind};
use crate::error::Error;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    pub role: RoleKind,
    pub expert_profile_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

// Auth routes

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    // login_session hands back the token of the session this request
    // created; the shared service state is never read here, so concurrent
    // logins cannot swap tokens between clients.
    match state.auth.login_session(&req.email, &req.password).await {
        Ok((account, token)) => (
            StatusCode::OK,
            Json(ApiResponse::ok(LoginResponse {
                token,
                account: AccountInfo::from(&account),
            })),
        )
            .into_response(),
        Err(Error::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::err(Error::InvalidCredentials.to_string())),
        )
            .into_response(),
        Err(Error::SessionCreationFailed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::err(
                Error::SessionCreationFailed.to_string(),
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err("Sign-in failed, please try again")),
            )
                .into_response()
        }
    }
}

/// Unguarded on purpose: signing out an already-dead session still answers
/// success, so the route stays idempotent.
pub async fn logout(State(state): State<SharedState>, req: Request) -> impl IntoResponse {
    if let Some(token) = extract_token(&req) {
        state.auth.revoke(&token).await;
    }
    Json(ApiResponse::ok("signed out"))
}

pub async fn current_account(Extension(account): Extension<Account>) -> impl IntoResponse {
    Json(ApiResponse::ok(AccountInfo::from(&account)))
}

pub async fn change_password(
    State(state): State<SharedState>,
    Extension(account): Extension<Account>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    match state
        .auth
        .change_password_for(
            account.id,
            Some(&token),
            &req.current_password,
            &req.new_password,
        )
        .await
    {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("password changed"))).into_response(),
        Err(Error::WrongCurrentPassword) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::err(
                Error::WrongCurrentPassword.to_string(),
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Password change failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err(Error::UpdateFailed.to_string())),
            )
                .into_response()
        }
    }
}

// Account routes (admin only)

pub async fn create_account(
    State(state): State<SharedState>,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let role = match (req.role, req.expert_profile_id) {
        (RoleKind::Admin, None) => Role::Admin,
        (RoleKind::Admin, Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::err(
                    "An admin account cannot link an expert profile",
                )),
            )
                .into_response()
        }
        (RoleKind::Expert, Some(profile_id)) => Role::Expert { profile_id },
        (RoleKind::Expert, None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::err(
                    "An expert account must link an expert profile",
                )),
            )
                .into_response()
        }
    };

    match state
        .auth
        .create_account(
            &req.email,
            &req.password,
            role,
            &req.first_name,
            &req.last_name,
        )
        .await
    {
        Ok(account) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(AccountInfo::from(&account))),
        )
            .into_response(),
        Err(e @ Error::AccountAlreadyExists(_)) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<()>::err(e.to_string())),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Account creation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::err("Could not create account")),
            )
                .into_response()
        }
    }
}
