use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

/// Custom header carrying the session token.
pub const TOKEN_HEADER: &str = "token";

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Identity of a signed-in shopper.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// The single configured administrator.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub email: String,
}

fn token_from_parts(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not Authorized Login Again".into()))
}

/// Verifies signature and expiry.
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!(error = %err, "token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)?;
        let claims = decode_claims(token, &state.config.jwt_secret)?;
        if claims.role != ROLE_USER {
            return Err(AppError::Unauthorized("Not Authorized Login Again".into()));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser { user_id })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)?;
        let claims = decode_claims(token, &state.config.jwt_secret)?;
        if claims.role != ROLE_ADMIN || claims.sub != state.config.admin_email {
            return Err(AppError::Unauthorized(
                "You Are Not Authorized Try again".into(),
            ));
        }

        Ok(AdminUser { email: claims.sub })
    }
}
