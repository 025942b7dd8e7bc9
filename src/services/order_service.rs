use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        DeleteOrderRequest, OrderList, PlaceOrderRequest, PlaceOrderResponse, UpdateStatusRequest,
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    middleware::auth::{AdminUser, AuthUser},
    models::Order,
    order::{OrderLines, OrderStatus, PlacementInput},
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

/// Validates the checkout body, persists the order, then empties the cart.
///
/// The order insert and the cart reset are two separate writes. The cart is
/// only touched once the order row exists. If the reset fails it is logged
/// and the order is still reported as placed, so the cart is not guaranteed
/// to be empty after a successful placement; callers re-read it.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderResponse>> {
    let valid = PlacementInput {
        user_id: Some(user.user_id),
        items: payload.items,
        amount: payload.amount,
        address: payload.address,
        payment_method: payload.payment_method,
    }
    .validate()?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(valid.user_id),
        items: Set(OrderLines(valid.items)),
        amount: Set(valid.amount),
        address: Set(valid.address),
        status: Set(OrderStatus::Pending),
        payment_method: Set(valid.payment_method),
        payment: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %order.user_id,
        amount = order.amount,
        payment_method = %order.payment_method,
        "order placed"
    );

    if let Err(err) = cart_service::clear_cart(state, user.user_id).await {
        tracing::error!(error = %err, order_id = %order.id, "cart clear failed after order placement");
    }

    Ok(ApiResponse::success(
        "Order placed successfully",
        PlaceOrderResponse { order_id: order.id },
        Some(Meta::empty()),
    ))
}

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let orders: Vec<Order> = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::total(orders.len());
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

pub async fn list_all_orders(
    state: &AppState,
    _admin: &AdminUser,
) -> AppResult<ApiResponse<OrderList>> {
    let orders: Vec<Order> = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::total(orders.len());
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

/// Sets any of the five statuses, regardless of the current one.
pub async fn update_status(
    state: &AppState,
    admin: &AdminUser,
    payload: UpdateStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".into()))?;
    let status: OrderStatus = payload.status.parse()?;

    let existing = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    let from = existing.status;

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    let order = active.update(&state.orm).await?;

    tracing::info!(
        admin = %admin.email,
        order_id = %order.id,
        from = %from,
        to = %order.status,
        "order status updated"
    );

    Ok(ApiResponse::success(
        "Status updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    admin: &AdminUser,
    payload: DeleteOrderRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".into()))?;

    let result = Orders::delete_by_id(order_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Order not found".into()));
    }

    tracing::info!(admin = %admin.email, order_id = %order_id, "order deleted");
    Ok(ApiResponse::success(
        "Order deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        items: model.items.0,
        amount: model.amount,
        address: model.address,
        status: model.status,
        payment_method: model.payment_method,
        payment: model.payment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
