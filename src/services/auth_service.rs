use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, RegisterRequest, TokenResponse, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    models::{Email, UserProfile},
    response::{ApiResponse, Meta},
    state::AppState,
};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

pub fn issue_token(config: &AppConfig, sub: &str, role: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: sub.to_owned(),
        role: role.to_owned(),
        exp: usize::try_from(expiration.timestamp())
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn map_unique_violation(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("User already exists".into())
        }
        _ => AppError::DbError(err),
    }
}

async fn email_taken(state: &AppState, email: &Email, except: Option<Uuid>) -> AppResult<bool> {
    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    Ok(matches!(exist, Some((id,)) if Some(id) != except))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;

    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    let email = Email::parse(&email)?;

    if email_taken(state, &email, None).await? {
        return Err(AppError::BadRequest("User already exists".into()));
    }
    validate_password(&password)?;

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(&name)
        .bind(email.as_str())
        .bind(password_hash)
        .execute(&state.pool)
        .await
        .map_err(map_unique_violation)?;

    let token = issue_token(&state.config, &id.to_string(), ROLE_USER)?;
    tracing::info!(user_id = %id, "user registered");

    Ok(ApiResponse::success(
        "User created",
        TokenResponse { token },
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let LoginRequest { email, password } = payload;
    let invalid = || AppError::BadRequest("Invalid credentials".into());

    let email = Email::parse(&email).map_err(|_| invalid())?;
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(email.as_str())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let token = issue_token(&state.config, &user.id.to_string(), ROLE_USER)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        TokenResponse { token },
        Some(Meta::empty()),
    ))
}

pub async fn admin_login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let config = &state.config;
    if payload.email != config.admin_email || payload.password != config.admin_password {
        tracing::warn!("rejected admin login");
        return Err(AppError::Unauthorized("Invalid admin credentials".into()));
    }

    let token = issue_token(config, &config.admin_email, ROLE_ADMIN)?;
    Ok(ApiResponse::success(
        "Logged in",
        TokenResponse { token },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(ApiResponse::success("OK", row.into(), Some(Meta::empty())))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let name = match payload.name.map(|n| n.trim().to_owned()) {
        Some(n) if n.is_empty() => return Err(AppError::BadRequest("Name is required".into())),
        other => other,
    };
    let email = payload.email.as_deref().map(Email::parse).transpose()?;

    if let Some(email) = &email {
        if email_taken(state, email, Some(user.user_id)).await? {
            return Err(AppError::BadRequest("Email is already taken".into()));
        }
    }

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET name = COALESCE($2, name), email = COALESCE($3, email)
        WHERE id = $1
        RETURNING id, name, email, password_hash, created_at
        "#,
    )
    .bind(user.user_id)
    .bind(name)
    .bind(email.map(Email::into_inner))
    .fetch_optional(&state.pool)
    .await
    .map_err(map_unique_violation)?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    tracing::info!(user_id = %row.id, "profile updated");
    Ok(ApiResponse::success("Profile updated", row.into(), Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::middleware::auth::decode_claims;

    fn config(ttl: i64) -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/unused".into(),
            host: "127.0.0.1".into(),
            port: 4000,
            jwt_secret: "test-secret".into(),
            admin_email: "admin@shop.test".into(),
            admin_password: "admin-password".into(),
            cors_origins: vec![],
            token_ttl_hours: ttl,
            upload_dir: PathBuf::from("uploads"),
        }
    }

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let config = config(24);
        let id = Uuid::new_v4().to_string();
        let token = issue_token(&config, &id, ROLE_USER).unwrap();

        let claims = decode_claims(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, ROLE_USER);
        assert!(decode_claims(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config(-2);
        let token = issue_token(&config, "someone", ROLE_USER).unwrap();
        assert!(matches!(
            decode_claims(&token, &config.jwt_secret),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long-enough").is_ok());
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong horse", &parsed).is_err());
    }
}
