use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::orders::{
        DeleteOrderRequest, OrderList, PlaceOrderRequest, PlaceOrderResponse, UpdateStatusRequest,
    },
    error::AppResult,
    middleware::{
        auth::{AdminUser, AuthUser},
        json::ApiJson,
    },
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/place", post(place_order))
        .route("/userOrders", post(user_orders))
        .route("/list", post(list_orders))
        .route("/status", post(update_status))
        .route("/delete", post(delete_order))
}

#[utoipa::path(
    post,
    path = "/api/order/place",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order created and cart cleared", body = ApiResponse<PlaceOrderResponse>),
        (status = 400, description = "Validation failed, nothing persisted"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<PlaceOrderResponse>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/userOrders",
    responses(
        (status = 200, description = "Caller's orders, newest first", body = ApiResponse<OrderList>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = [])),
    tag = "Orders"
)]
pub async fn user_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_user_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/list",
    responses(
        (status = 200, description = "All orders, newest first (admin only)", body = ApiResponse<OrderList>),
        (status = 401, description = "Not the administrator"),
    ),
    security(("token" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_all_orders(&state, &admin).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Missing order id or invalid status"),
        (status = 401, description = "Not the administrator"),
        (status = 404, description = "Order not found"),
    ),
    security(("token" = [])),
    tag = "Admin"
)]
pub async fn update_status(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_status(&state, &admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order/delete",
    request_body = DeleteOrderRequest,
    responses(
        (status = 200, description = "Order deleted"),
        (status = 400, description = "Missing order id"),
        (status = 401, description = "Not the administrator"),
        (status = 404, description = "Order not found"),
    ),
    security(("token" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<DeleteOrderRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::delete_order(&state, &admin, payload).await?;
    Ok(Json(resp))
}
