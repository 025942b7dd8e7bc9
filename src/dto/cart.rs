use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cart::CartData;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateCartRequest {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub size: String,
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct MergeCartRequest {
    #[serde(default)]
    pub guest_cart: CartData,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CartResponse {
    pub cart_data: CartData,
}
