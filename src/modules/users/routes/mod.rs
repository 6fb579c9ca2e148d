use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use bookshelf_authz::password::verify_password;
use bookshelf_http::{AppError, CurrentUser};
use bookshelf_kernel::Services;

use super::models::{LoginRequest, TokenResponse, UserView};
use super::repository::UserRepository;
use crate::utils;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Exchange an email and password for an access token
pub async fn login(
    State(services): State<Services>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(credentials) = payload.map_err(utils::reject_body)?;

    let repo = UserRepository::new(services.db.clone());
    let Some(user) = repo.find_by_email(&credentials.username).await? else {
        tracing::info!(username = %credentials.username, "login for unknown user");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    // Argon2 verification blocks for tens of milliseconds.
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&credentials.password, &stored_hash))
        .await
        .context("password verification task failed")?
        .context("password verification failed")?;
    if !verified {
        tracing::info!(user_id = user.id, "login with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = services
        .auth
        .issue(&user.email, &user.roles())
        .context("failed to issue access token")?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

/// The account behind the presented token
pub async fn me(
    State(services): State<Services>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserView>, AppError> {
    let user = UserRepository::new(services.db.clone())
        .find_by_email(&claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("The account behind this token no longer exists"))?;

    Ok(Json(UserView::from(&user)))
}
