//! Login, registration and profile of administrators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::Valid;
use crate::token::Claims;
use crate::user::User;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginBody {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token_type: String,
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// Handler of `POST /auth/login`.
pub async fn login(
    State(state): State<AppState>,
    Valid(body): Valid<LoginBody>,
) -> Result<Json<LoginResponse>> {
    let session = state.auth.login(&body.username, &body.password).await?;

    Ok(Json(LoginResponse {
        token_type: TOKEN_TYPE.to_owned(),
        token: session.token,
        expires_in: session.expires_in,
        user: session.user,
    }))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be 3 to 50 characters long."
    ))]
    pub username: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 255,
        message = "Password must contain at least 6 characters."
    ))]
    pub password: String,
}

/// Handler of `POST /auth/register`.
pub async fn register(
    State(state): State<AppState>,
    Valid(body): Valid<RegisterBody>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state
        .auth
        .register(body.username.trim(), body.email.trim(), &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler of `GET /auth/profile`.
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>> {
    let id = claims
        .user_id()
        .ok_or(ServerError::Unauthorized("Invalid or expired token"))?;

    Ok(Json(state.auth.profile(id).await?))
}
