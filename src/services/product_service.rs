use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::products::{NewProduct, ProductList},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel, StringList},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Most images a product may carry.
pub const MAX_IMAGES: usize = 4;

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let items: Vec<Product> = Products::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity)
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    Ok(ApiResponse::success("Product", product, None))
}

pub fn validate_new_product(product: &NewProduct) -> AppResult<()> {
    if product.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    if product.price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if product.category.trim().is_empty() || product.sub_category.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Category and sub category are required".into(),
        ));
    }
    if product.sizes.iter().any(|size| size.trim().is_empty()) {
        return Err(AppError::BadRequest("Size labels must not be empty".into()));
    }
    if product.images.len() > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_IMAGES} images are allowed"
        )));
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    payload: NewProduct,
) -> AppResult<ApiResponse<Product>> {
    validate_new_product(&payload)?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_owned()),
        description: Set(payload.description),
        price: Set(payload.price),
        category: Set(payload.category),
        sub_category: Set(payload.sub_category),
        sizes: Set(StringList(payload.sizes)),
        images: Set(StringList(payload.images)),
        bestseller: Set(payload.bestseller),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;
    tracing::info!(admin = %admin.email, product_id = %product.id, "product added");

    Ok(ApiResponse::success(
        "Product Added",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn remove_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    state.images.remove_all(&existing.images.0).await;
    tracing::info!(admin = %admin.email, product_id = %id, "product removed");

    Ok(ApiResponse::success(
        "Product Removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        sub_category: model.sub_category,
        sizes: model.sizes.0,
        images: model.images.0,
        bestseller: model.bestseller,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
