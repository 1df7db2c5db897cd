// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::auth::password::hash_password;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::handlers::validate;
use crate::middleware::AppJson;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth/register - create an account
///
/// ```json
/// { "username": "ada", "email": "ada@example.com", "password": "correct horse" }
/// ```
///
/// Emails are stored lower-cased, so registration is case-insensitive on email.
#[instrument(skip_all, fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> ApiResult<()> {
    validate::length_between("username", &request.username, validate::USERNAME_CHARS)?;
    validate::required("email", &request.email)?;
    validate::email("email", &request.email)?;
    validate::length_between("password", &request.password, validate::PASSWORD_CHARS)?;

    let email = request.email.to_lowercase();
    if state.repo.find_user_by_email(&email).await?.is_some() {
        debug!("User with email '{}' already exists", email);
        return Err(ApiError::conflict("User with email already exists"));
    }

    let password_hash = hash_password(&request.password)?;
    let user = state
        .repo
        .create_user(NewUser {
            username: request.username,
            email,
            password_hash,
        })
        .await?;

    info!("User {} created", user.id);
    Ok(ApiResponse::message_only(
        StatusCode::CREATED,
        "User created successfully",
    ))
}
