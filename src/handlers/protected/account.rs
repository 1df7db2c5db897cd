// handlers/protected/account.rs - GET /api/profile, POST /api/delete

use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument, warn};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /api/profile - echo the caller's token identity
pub async fn profile(user: AuthUser) -> ApiResult<serde_json::Value> {
    Ok(ApiResponse::ok(
        "Welcome to your profile!",
        serde_json::json!({
            "user_id": user.user_id,
            "email": user.email,
            "username": user.username,
        }),
    ))
}

/// POST /api/delete - delete the caller's own account and all their projects
///
/// Only the token subject is used; the request body is ignored.
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn delete_account(State(state): State<AppState>, user: AuthUser) -> ApiResult<()> {
    if !state.repo.delete_user(user.user_id).await? {
        warn!("Account for token subject no longer exists");
        return Err(ApiError::not_found("User account not found or already deleted."));
    }

    info!("User {} ({}) deleted", user.user_id, user.email);
    Ok(ApiResponse::message_only(
        StatusCode::OK,
        "User account deleted successfully",
    ))
}
