use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProductIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

/// Validated input for a new catalogue entry. Images are already stored and
/// referenced by their public paths.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub sub_category: String,
    pub sizes: Vec<String>,
    pub images: Vec<String>,
    pub bestseller: bool,
}

/// Multipart form of the add-product endpoint, documented for OpenAPI only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AddProductForm {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub sub_category: String,
    /// JSON array of size labels, e.g. `["S","M"]`.
    pub sizes: String,
    pub bestseller: Option<bool>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image1: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image2: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image3: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image4: Option<Vec<u8>>,
}
