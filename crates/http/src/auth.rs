//! Bearer-token extractors gating handlers by role.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use bookshelf_authz::{Claims, Role};
use bookshelf_kernel::Services;

use crate::error::AppError;

/// Any caller holding a valid access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

/// A caller whose token grants `ROLE_ADMIN`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

fn claims_from_parts(parts: &Parts, services: &Services) -> Result<Claims, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| AppError::unauthorized("Malformed authorization header"))?;

    services.auth.authenticate_bearer(value).map_err(|err| {
        tracing::debug!(error = %err, "access token rejected");
        AppError::unauthorized("Invalid or expired access token")
    })
}

impl FromRequestParts<Services> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Services) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state).map(CurrentUser)
    }
}

impl FromRequestParts<Services> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Services) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if !claims.has_role(Role::Admin) {
            tracing::info!(subject = %claims.sub, "admin role required");
            return Err(AppError::forbidden(
                "You do not have sufficient rights to perform this operation",
            ));
        }
        Ok(AdminUser(claims))
    }
}
