//! Order snapshot types and placement validation.

use std::{fmt, str::FromStr};

use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

const MIN_ADDRESS_LEN: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("User authentication required")]
    MissingUser,

    #[error("Payment method is required")]
    MissingPaymentMethod,

    #[error("Order items are required")]
    MissingItems,

    #[error("Amount and address are required")]
    MissingAmountOrAddress,

    #[error("Invalid payment method: {0}. Allowed: COD, BANK_TRANSFER")]
    InvalidPaymentMethod(String),

    #[error("Invalid status: {0}. Allowed: pending, processing, shipped, delivered, cancelled")]
    InvalidStatus(String),

    #[error("Order validation failed: {0}")]
    Schema(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "COD")]
    #[serde(rename = "COD")]
    CashOnDelivery,
    #[sea_orm(string_value = "BANK_TRANSFER")]
    #[serde(rename = "BANK_TRANSFER")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "COD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(PaymentMethod::CashOnDelivery),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            other => Err(OrderError::InvalidPaymentMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle label. Administrators may move an order between any two
/// statuses, backwards included.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::InvalidStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Copy of a product as it was when the order was placed, plus the chosen
/// size and quantity. Later edits or deletion of the product never reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLineItem {
    pub product_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub bestseller: bool,
    pub size: String,
    pub quantity: u32,
}

impl OrderLineItem {
    pub fn snapshot(product: &Product, size: &str, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
            sub_category: product.sub_category.clone(),
            images: product.images.clone(),
            bestseller: product.bestseller,
            size: size.to_owned(),
            quantity,
        }
    }

    fn check(&self, index: usize) -> Result<(), OrderError> {
        if self.size.trim().is_empty() {
            return Err(OrderError::Schema(format!("items[{index}]: size is required")));
        }
        if self.quantity == 0 {
            return Err(OrderError::Schema(format!(
                "items[{index}]: quantity must be at least 1"
            )));
        }
        if self.price < 0 {
            return Err(OrderError::Schema(format!(
                "items[{index}]: price must not be negative"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct OrderLines(pub Vec<OrderLineItem>);

/// Raw placement input as it arrives at the boundary.
#[derive(Debug, Default)]
pub struct PlacementInput {
    pub user_id: Option<Uuid>,
    pub items: Option<Vec<serde_json::Value>>,
    pub amount: Option<i64>,
    pub address: Option<String>,
    pub payment_method: Option<String>,
}

/// Placement input that passed every check and can be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderLineItem>,
    pub amount: i64,
    pub address: String,
    pub payment_method: PaymentMethod,
}

impl PlacementInput {
    /// Presence checks first, then the payment method, then the shape of
    /// each line, amount and address.
    pub fn validate(self) -> Result<ValidOrder, OrderError> {
        let user_id = self.user_id.ok_or(OrderError::MissingUser)?;

        let payment_method = self
            .payment_method
            .filter(|m| !m.is_empty())
            .ok_or(OrderError::MissingPaymentMethod)?;

        let raw_items = self
            .items
            .filter(|items| !items.is_empty())
            .ok_or(OrderError::MissingItems)?;

        let (amount, address) = match (self.amount, self.address) {
            (Some(amount), Some(address)) if amount != 0 && !address.trim().is_empty() => {
                (amount, address)
            }
            _ => return Err(OrderError::MissingAmountOrAddress),
        };

        let payment_method = payment_method.parse::<PaymentMethod>()?;

        let mut items = Vec::with_capacity(raw_items.len());
        for (index, raw) in raw_items.into_iter().enumerate() {
            let item: OrderLineItem = serde_json::from_value(raw)
                .map_err(|e| OrderError::Schema(format!("items[{index}]: {e}")))?;
            item.check(index)?;
            items.push(item);
        }

        if amount <= 0 {
            return Err(OrderError::Schema("amount must be positive".into()));
        }
        let address = address.trim().to_owned();
        if address.chars().count() < MIN_ADDRESS_LEN {
            return Err(OrderError::Schema(format!(
                "address must be at least {MIN_ADDRESS_LEN} characters"
            )));
        }

        Ok(ValidOrder {
            user_id,
            items,
            amount,
            address,
            payment_method,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn line() -> serde_json::Value {
        json!({
            "product_id": Uuid::nil(),
            "name": "Tee",
            "price": 1500,
            "size": "M",
            "quantity": 2
        })
    }

    fn input() -> PlacementInput {
        PlacementInput {
            user_id: Some(Uuid::new_v4()),
            items: Some(vec![line()]),
            amount: Some(4000),
            address: Some("12 Long Road, Lagos".into()),
            payment_method: Some("COD".into()),
        }
    }

    #[test]
    fn valid_input_passes() {
        let order = input().validate().unwrap();
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].category, "");
    }

    #[test]
    fn empty_items_fail() {
        let mut empty = input();
        empty.items = Some(vec![]);
        assert_eq!(empty.validate(), Err(OrderError::MissingItems));

        let mut missing = input();
        missing.items = None;
        assert_eq!(missing.validate(), Err(OrderError::MissingItems));
    }

    #[test]
    fn unknown_payment_method_names_allowed_values() {
        let mut bad = input();
        bad.payment_method = Some("CASH_APP".into());
        let err = bad.validate().unwrap_err();
        assert_eq!(err, OrderError::InvalidPaymentMethod("CASH_APP".into()));
        let message = err.to_string();
        assert!(message.contains("COD"));
        assert!(message.contains("BANK_TRANSFER"));
    }

    #[test]
    fn presence_checks_run_in_order() {
        let all_missing = PlacementInput::default();
        assert_eq!(all_missing.validate(), Err(OrderError::MissingUser));

        let mut no_method = input();
        no_method.payment_method = Some(String::new());
        no_method.items = None;
        assert_eq!(no_method.validate(), Err(OrderError::MissingPaymentMethod));

        let mut no_address = input();
        no_address.address = Some("   ".into());
        assert_eq!(no_address.validate(), Err(OrderError::MissingAmountOrAddress));

        let mut zero_amount = input();
        zero_amount.amount = Some(0);
        assert_eq!(zero_amount.validate(), Err(OrderError::MissingAmountOrAddress));
    }

    #[test]
    fn schema_checks() {
        let mut malformed = input();
        malformed.items = Some(vec![json!({ "name": "Tee" })]);
        assert!(matches!(malformed.validate(), Err(OrderError::Schema(m)) if m.starts_with("items[0]")));

        let mut zero_qty = input();
        let mut item = line();
        item["quantity"] = json!(0);
        zero_qty.items = Some(vec![item]);
        assert!(matches!(zero_qty.validate(), Err(OrderError::Schema(_))));

        let mut negative = input();
        negative.amount = Some(-10);
        assert!(matches!(negative.validate(), Err(OrderError::Schema(_))));

        let mut short = input();
        short.address = Some("abc".into());
        let err = short.validate().unwrap_err();
        assert!(err.to_string().starts_with("Order validation failed"));
    }

    #[test]
    fn status_parses_all_five_and_rejects_others() {
        for status in ["pending", "processing", "shipped", "delivered", "cancelled"] {
            let parsed: OrderStatus = status.parse().unwrap();
            assert_eq!(parsed.as_str(), status);
        }
        for bad in ["paid", "Pending", "", "completed"] {
            assert!(bad.parse::<OrderStatus>().is_err());
        }
    }

    #[test]
    fn payment_method_wire_names() {
        assert_eq!(
            serde_json::to_value(PaymentMethod::BankTransfer).unwrap(),
            json!("BANK_TRANSFER")
        );
        assert_eq!(serde_json::to_value(OrderStatus::Shipped).unwrap(), json!("shipped"));
    }
}
