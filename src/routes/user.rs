use axum::{Json, Router, extract::State, routing::{get, post}};

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, TokenResponse, UpdateProfileRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::UserProfile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin", post(admin_login))
        .route("/profile", get(get_profile).put(update_profile))
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created, session token returned", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid input or email already registered")
    ),
    tag = "User"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "User"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin token", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid admin credentials")
    ),
    tag = "User"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let resp = auth_service::admin_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/profile",
    responses(
        (status = 200, description = "Caller's profile", body = ApiResponse<UserProfile>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "User"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid name or email"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "User"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
