use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{AddToCartRequest, CartResponse, MergeCartRequest, UpdateCartRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get", post(get_cart))
        .route("/add", post(add_to_cart))
        .route("/update", post(update_cart))
        .route("/merge", post(merge_cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/get",
    responses(
        (status = 200, description = "Caller's cart mapping", body = ApiResponse<CartResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Quantity incremented by one", body = ApiResponse<CartResponse>),
        (status = 400, description = "Missing size or product id"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/update",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity set; zero or less removes the entry", body = ApiResponse<CartResponse>),
        (status = 400, description = "Missing size or product id"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::update_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/merge",
    request_body = MergeCartRequest,
    responses(
        (status = 200, description = "Guest quantities added onto the server cart", body = ApiResponse<CartResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "Cart"
)]
pub async fn merge_cart(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<MergeCartRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let resp = cart_service::merge_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}
