//! Cart mapping shared by the server document and the client mirror.
//!
//! A cart is `product id -> size label -> quantity`. Every value of
//! [`CartData`] upholds two invariants: no stored quantity is zero, and no
//! product maps to an empty size table. Non-positive quantities coming in
//! from storage or the wire are dropped while deserializing.

use std::collections::BTreeMap;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::Product;

type SizeTable = BTreeMap<String, u32>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("Please select product size")]
    MissingSize,

    #[error("Product id is required")]
    MissingProduct,
}

/// One flattened `(product, size, quantity)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine<'a> {
    pub product_id: &'a str,
    pub size: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromJsonQueryResult, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct CartData(BTreeMap<String, SizeTable>);

impl<'de> Deserialize<'de> for CartData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, BTreeMap<String, i64>>::deserialize(deserializer)?;
        let mut cart = CartData::default();
        for (product_id, sizes) in raw {
            for (size, quantity) in sizes {
                if quantity > 0 && !size.is_empty() {
                    cart.insert(&product_id, &size, clamp_quantity(quantity));
                }
            }
        }
        Ok(cart)
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity).unwrap_or(u32::MAX)
}

fn check_key(product_id: &str, size: &str) -> Result<(), CartError> {
    if product_id.is_empty() {
        return Err(CartError::MissingProduct);
    }
    if size.is_empty() {
        return Err(CartError::MissingSize);
    }
    Ok(())
}

impl CartData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Current quantity for a key, zero when absent.
    pub fn quantity(&self, product_id: &str, size: &str) -> u32 {
        self.0
            .get(product_id)
            .and_then(|sizes| sizes.get(size))
            .copied()
            .unwrap_or(0)
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.0.contains_key(product_id)
    }

    /// Increments `(product_id, size)` by one and returns the new quantity.
    ///
    /// Each call adds a unit, so a retried request counts twice.
    pub fn add_one(&mut self, product_id: &str, size: &str) -> Result<u32, CartError> {
        check_key(product_id, size)?;
        let quantity = self
            .0
            .entry(product_id.to_owned())
            .or_default()
            .entry(size.to_owned())
            .or_insert(0);
        *quantity = quantity.saturating_add(1);
        Ok(*quantity)
    }

    /// Absolute set. A quantity of zero or less removes the size entry and,
    /// if it was the last size, the product entry. Returns the previous
    /// quantity.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        size: &str,
        quantity: i64,
    ) -> Result<u32, CartError> {
        check_key(product_id, size)?;
        let previous = self.quantity(product_id, size);
        if quantity <= 0 {
            self.remove(product_id, size);
        } else {
            self.insert(product_id, size, clamp_quantity(quantity));
        }
        Ok(previous)
    }

    /// Adds every positive guest quantity onto the matching key.
    /// Returns how many `(product, size)` entries were merged.
    pub fn merge(&mut self, guest: &CartData) -> usize {
        let mut merged = 0;
        for line in guest.lines() {
            let sizes = self.0.entry(line.product_id.to_owned()).or_default();
            let quantity = sizes.entry(line.size.to_owned()).or_insert(0);
            *quantity = quantity.saturating_add(line.quantity);
            merged += 1;
        }
        merged
    }

    /// Sum of all quantities.
    pub fn count(&self) -> u64 {
        self.lines().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `price * quantity` over entries whose product is still listed.
    /// Entries for unknown products contribute nothing.
    pub fn amount_total(&self, products: &[Product]) -> i64 {
        self.0
            .iter()
            .filter_map(|(product_id, sizes)| {
                let product = products.iter().find(|p| p.id.to_string() == *product_id)?;
                let units: i64 = sizes.values().map(|q| i64::from(*q)).sum();
                Some(product.price.saturating_mul(units))
            })
            .fold(0_i64, i64::saturating_add)
    }

    pub fn lines(&self) -> impl Iterator<Item = CartLine<'_>> {
        self.0.iter().flat_map(|(product_id, sizes)| {
            sizes.iter().map(move |(size, quantity)| CartLine {
                product_id,
                size,
                quantity: *quantity,
            })
        })
    }

    fn insert(&mut self, product_id: &str, size: &str, quantity: u32) {
        self.0
            .entry(product_id.to_owned())
            .or_default()
            .insert(size.to_owned(), quantity);
    }

    fn remove(&mut self, product_id: &str, size: &str) {
        if let Some(sizes) = self.0.get_mut(product_id) {
            sizes.remove(size);
            if sizes.is_empty() {
                self.0.remove(product_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn cart(json: serde_json::Value) -> CartData {
        serde_json::from_value(json).expect("cart json")
    }

    fn product(id: Uuid, price: i64) -> Product {
        Product {
            id,
            name: "Tee".into(),
            description: "Cotton".into(),
            price,
            category: "Men".into(),
            sub_category: "Topwear".into(),
            sizes: vec!["M".into(), "L".into()],
            images: vec![],
            bestseller: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn add_twice_then_zero_removes_product() {
        let mut cart = CartData::new();
        cart.add_one("p1", "M").unwrap();
        cart.add_one("p1", "M").unwrap();
        assert_eq!(cart, self::cart(serde_json::json!({ "p1": { "M": 2 } })));

        let previous = cart.set_quantity("p1", "M", 0).unwrap();
        assert_eq!(previous, 2);
        assert!(cart.is_empty());
        assert_eq!(serde_json::to_value(&cart).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn add_requires_size() {
        let mut cart = CartData::new();
        assert_eq!(cart.add_one("p1", ""), Err(CartError::MissingSize));
        assert!(cart.is_empty());
    }

    #[test]
    fn negative_quantity_keeps_other_sizes() {
        let mut cart = cart(serde_json::json!({ "p1": { "M": 1, "L": 4 } }));
        cart.set_quantity("p1", "M", -3).unwrap();
        assert_eq!(cart, self::cart(serde_json::json!({ "p1": { "L": 4 } })));
    }

    #[test]
    fn set_quantity_on_absent_key_creates_entry() {
        let mut cart = CartData::new();
        assert_eq!(cart.set_quantity("p9", "S", 3).unwrap(), 0);
        assert_eq!(cart.quantity("p9", "S"), 3);
    }

    #[test]
    fn mixed_operations_never_store_non_positive() {
        let mut cart = CartData::new();
        let ops: [(&str, &str, i64); 8] = [
            ("a", "S", 2),
            ("a", "M", 0),
            ("b", "L", 5),
            ("a", "S", -1),
            ("b", "L", 1),
            ("c", "XL", 0),
            ("b", "L", 0),
            ("d", "M", 7),
        ];
        for (product_id, size, quantity) in ops {
            cart.set_quantity(product_id, size, quantity).unwrap();
            cart.add_one(product_id, "M").unwrap();
            assert!(cart.lines().all(|line| line.quantity > 0));
            assert!(cart.0.values().all(|sizes| !sizes.is_empty()));
        }
    }

    #[test]
    fn merge_is_additive_per_key() {
        let mut server = cart(serde_json::json!({ "A": { "M": 2 } }));
        let guest = cart(serde_json::json!({ "A": { "M": 3 }, "B": { "L": 1 } }));
        assert_eq!(server.merge(&guest), 2);
        assert_eq!(
            server,
            cart(serde_json::json!({ "A": { "M": 5 }, "B": { "L": 1 } }))
        );
    }

    #[test]
    fn merge_empty_guest_is_noop() {
        let mut server = cart(serde_json::json!({ "A": { "M": 2 } }));
        let before = server.clone();
        assert_eq!(server.merge(&CartData::new()), 0);
        assert_eq!(server, before);
    }

    #[test]
    fn deserialize_drops_non_positive_entries() {
        let cart = cart(serde_json::json!({
            "A": { "M": 0, "L": -2 },
            "B": { "S": 1, "M": 0 }
        }));
        assert!(!cart.contains_product("A"));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn count_sums_all_sizes() {
        let cart = cart(serde_json::json!({ "A": { "M": 2, "L": 1 }, "B": { "S": 4 } }));
        assert_eq!(cart.count(), 7);
    }

    #[test]
    fn amount_total_skips_missing_products() {
        let listed = Uuid::new_v4();
        let deleted = Uuid::new_v4();
        let mut cart = CartData::new();
        cart.set_quantity(&listed.to_string(), "M", 1).unwrap();
        cart.set_quantity(&listed.to_string(), "L", 2).unwrap();
        cart.set_quantity(&deleted.to_string(), "M", 2).unwrap();
        let products = vec![product(listed, 1500)];
        assert_eq!(cart.amount_total(&products), 4500);
        assert_eq!(cart.amount_total(&[]), 0);
    }
}
