use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::Order,
    order::{OrderLineItem, PaymentMethod},
};

/// Checkout body. Fields stay optional and items stay loosely typed so that
/// missing or malformed input is reported as a validation failure instead of
/// an extractor rejection.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PlaceOrderRequest {
    #[schema(value_type = Option<Vec<OrderLineItem>>)]
    pub items: Option<Vec<serde_json::Value>>,
    pub amount: Option<i64>,
    pub address: Option<String>,
    #[schema(value_type = Option<PaymentMethod>)]
    pub payment_method: Option<String>,
}

impl PlaceOrderRequest {
    pub fn new(
        items: &[OrderLineItem],
        amount: i64,
        address: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> serde_json::Result<Self> {
        let items = items
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(Self {
            items: Some(items),
            amount: Some(amount),
            address: Some(address.into()),
            payment_method: Some(payment_method.as_str().to_owned()),
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DeleteOrderRequest {
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
