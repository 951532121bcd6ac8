//! Auth route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use atelier_core::UserRole;

use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    /// Ignored unless the caller is an authenticated admin.
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

/// Create an account.
///
/// Anyone can self-register as a client. Only an authenticated admin may
/// request a different role, so the role field in an anonymous request is
/// silently dropped rather than rejected.
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let caller_is_admin = caller.is_some_and(|u| u.role.is_admin());
    let role = match req.role {
        Some(role) if caller_is_admin => role,
        _ => UserRole::Client,
    };

    let service = AuthService::new(state.pool(), state.tokens());
    let user = service
        .register(&req.email, &req.name, &req.password, role)
        .await?;

    tracing::info!(user_id = %user.id, %role, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AuthService::new(state.pool(), state.tokens());
    let (user, access_token) = service.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        user,
    }))
}

/// Current user from the bearer token.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
