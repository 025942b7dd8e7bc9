//! Server-side cart document operations.
//!
//! Every mutation is a read-modify-write of the whole `cart_data` document.
//! Concurrent writes for the same user are last-write-wins.

use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    cart::CartData,
    dto::cart::{AddToCartRequest, CartResponse, MergeCartRequest, UpdateCartRequest},
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn load_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn save_cart(state: &AppState, model: UserModel, cart: CartData) -> AppResult<CartData> {
    let mut active: UserActive = model.into();
    active.cart_data = Set(cart);
    let updated = active.update(&state.orm).await?;
    Ok(updated.cart_data)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartResponse>> {
    let model = load_user(state, user).await?;
    Ok(ApiResponse::success(
        "OK",
        CartResponse {
            cart_data: model.cart_data,
        },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartResponse>> {
    let model = load_user(state, user).await?;
    let mut cart = model.cart_data.clone();
    let quantity = cart.add_one(&payload.item_id, &payload.size)?;

    let cart_data = save_cart(state, model, cart).await?;
    tracing::debug!(
        user_id = %user.user_id,
        item_id = %payload.item_id,
        size = %payload.size,
        quantity,
        "cart increment"
    );

    Ok(ApiResponse::success(
        "Added To Cart",
        CartResponse { cart_data },
        Some(Meta::empty()),
    ))
}

pub async fn update_cart(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartResponse>> {
    let model = load_user(state, user).await?;
    let mut cart = model.cart_data.clone();
    let previous = apply_update(&mut cart, &payload)?;

    let cart_data = if cart == model.cart_data {
        model.cart_data
    } else {
        save_cart(state, model, cart).await?
    };
    tracing::debug!(
        user_id = %user.user_id,
        item_id = %payload.item_id,
        size = %payload.size,
        previous,
        quantity = payload.quantity,
        "cart set quantity"
    );

    Ok(ApiResponse::success(
        "Cart Updated",
        CartResponse { cart_data },
        Some(Meta::empty()),
    ))
}

pub async fn merge_cart(
    state: &AppState,
    user: &AuthUser,
    payload: MergeCartRequest,
) -> AppResult<ApiResponse<CartResponse>> {
    let model = load_user(state, user).await?;
    if payload.guest_cart.is_empty() {
        return Ok(ApiResponse::success(
            "No guest cart to merge",
            CartResponse {
                cart_data: model.cart_data,
            },
            Some(Meta::empty()),
        ));
    }

    let mut cart = model.cart_data.clone();
    let merged = cart.merge(&payload.guest_cart);
    let cart_data = save_cart(state, model, cart).await?;
    tracing::info!(user_id = %user.user_id, entries = merged, "guest cart merged");

    Ok(ApiResponse::success(
        "Guest cart merged successfully",
        CartResponse { cart_data },
        Some(Meta::empty()),
    ))
}

/// Absolute set on a product already in the cart. Returns the previous
/// quantity for the size.
fn apply_update(cart: &mut CartData, payload: &UpdateCartRequest) -> AppResult<u32> {
    if !payload.item_id.is_empty() && !cart.contains_product(&payload.item_id) {
        return Err(AppError::BadRequest("Item not found in cart".into()));
    }
    Ok(cart.set_quantity(&payload.item_id, &payload.size, payload.quantity)?)
}

/// Resets the user's cart to an empty document.
pub async fn clear_cart(state: &AppState, user_id: uuid::Uuid) -> AppResult<()> {
    let active = UserActive {
        id: Set(user_id),
        cart_data: Set(CartData::new()),
        ..Default::default()
    };
    active.update(&state.orm).await?;
    Ok(())
}
