// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::auth::password::verify_password;
use crate::error::ApiError;
use crate::handlers::validate;
use crate::middleware::AppJson;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /auth/login - exchange credentials for a bearer token
///
/// Unknown emails and wrong passwords get the same 401 so callers cannot probe
/// which accounts exist.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    validate::required("email", &request.email)?;
    validate::email("email", &request.email)?;
    validate::required("password", &request.password)?;

    let email = request.email.to_lowercase();
    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        debug!("Login attempt for unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&request.password, &user.password_hash)? {
        debug!("Password mismatch for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(user.id, &user.email, &user.username)?;
    info!("User {} logged in", user.id);
    Ok(ApiResponse::ok("Login successful", LoginResponse { token }))
}
