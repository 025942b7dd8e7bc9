use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    routing::{get, post},
};

use crate::{
    dto::products::{AddProductForm, NewProduct, ProductIdRequest, ProductList},
    error::{AppError, AppResult},
    middleware::{auth::AdminUser, json::ApiJson},
    models::Product,
    response::ApiResponse,
    services::{
        image_store::MAX_IMAGE_BYTES,
        product_service::{self, MAX_IMAGES},
    },
    state::AppState,
};

/// Upper bound for an add-product form including all four images.
pub const MAX_UPLOAD_BYTES: usize = MAX_IMAGES * MAX_IMAGE_BYTES + 1024 * 1024;

const IMAGE_FIELDS: [&str; MAX_IMAGES] = ["image1", "image2", "image3", "image4"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_products).post(list_products))
        .route("/single", post(single_product))
        .route(
            "/add",
            post(add_product).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/remove", post(remove_product))
}

#[utoipa::path(
    get,
    path = "/api/products/list",
    responses(
        (status = 200, description = "Whole catalogue, newest first", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/single",
    request_body = ProductIdRequest,
    responses(
        (status = 200, description = "One product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn single_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProductIdRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, payload.id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/add",
    request_body(content = AddProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product added", body = ApiResponse<Product>),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Not the administrator"),
    ),
    security(("token" = [])),
    tag = "Admin"
)]
pub async fn add_product(
    State(state): State<AppState>,
    admin: AdminUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let mut multipart = multipart.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let mut form = ProductForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        if IMAGE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if !bytes.is_empty() {
                form.images.push((file_name, bytes));
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.set(&name, value)?;
        }
    }

    let (mut product, files) = form.finish()?;
    product_service::validate_new_product(&product)?;

    product.images = state
        .images
        .save_all(
            files
                .iter()
                .map(|(name, bytes)| (name.as_deref(), &bytes[..]))
                .collect::<Vec<_>>(),
        )
        .await?;
    let stored = product.images.clone();

    match product_service::create_product(&state, &admin, product).await {
        Ok(resp) => Ok(Json(resp)),
        Err(err) => {
            state.images.remove_all(&stored).await;
            Err(err)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/products/remove",
    request_body = ProductIdRequest,
    responses(
        (status = 200, description = "Product removed"),
        (status = 401, description = "Not the administrator"),
        (status = 404, description = "Product not found"),
    ),
    security(("token" = [])),
    tag = "Admin"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(payload): ApiJson<ProductIdRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::remove_product(&state, &admin, payload.id).await?;
    Ok(Json(resp))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

/// Text fields and raw image parts collected from the add-product form.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    description: String,
    price: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    sizes: Option<String>,
    bestseller: bool,
    images: Vec<(Option<String>, Bytes)>,
}

impl ProductForm {
    fn set(&mut self, field: &str, value: String) -> AppResult<()> {
        match field {
            "name" => self.name = Some(value),
            "description" => self.description = value,
            "price" => self.price = Some(value),
            "category" => self.category = Some(value),
            "subCategory" | "sub_category" => self.sub_category = Some(value),
            "sizes" => self.sizes = Some(value),
            "bestseller" => self.bestseller = parse_flag(&value),
            other => {
                return Err(AppError::BadRequest(format!("Unexpected form field: {other}")));
            }
        }
        Ok(())
    }

    fn finish(self) -> AppResult<(NewProduct, Vec<(Option<String>, Bytes)>)> {
        if self.images.len() > MAX_IMAGES {
            return Err(AppError::BadRequest(format!(
                "At most {MAX_IMAGES} images are allowed"
            )));
        }
        let price = self
            .price
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| AppError::BadRequest("Price is required".into()))?
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest("Price must be a whole number".into()))?;
        let sizes = match self.sizes.as_deref() {
            Some(raw) => parse_sizes(raw)?,
            None => Vec::new(),
        };

        let product = NewProduct {
            name: self.name.unwrap_or_default(),
            description: self.description,
            price,
            category: self.category.unwrap_or_default(),
            sub_category: self.sub_category.unwrap_or_default(),
            sizes,
            images: Vec::new(),
            bestseller: self.bestseller,
        };
        Ok((product, self.images))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "on")
}

/// Accepts a JSON array (`["S","M"]`) or a comma separated list (`S,M`).
fn parse_sizes(raw: &str) -> AppResult<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.starts_with('[') {
        return serde_json::from_str(raw)
            .map_err(|_| AppError::BadRequest("Sizes must be a JSON array of strings".into()));
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|size| !size.is_empty())
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_accept_json_or_comma_list() {
        assert_eq!(parse_sizes(r#"["S","M"]"#).unwrap(), vec!["S", "M"]);
        assert_eq!(parse_sizes("S, M ,L").unwrap(), vec!["S", "M", "L"]);
        assert!(parse_sizes("").unwrap().is_empty());
        assert!(parse_sizes("[1,2").is_err());
    }

    #[test]
    fn form_requires_numeric_price() {
        let mut form = ProductForm::default();
        form.set("name", "Shirt".into()).unwrap();
        assert!(form.finish().is_err());

        let mut form = ProductForm::default();
        form.set("price", "12.50".into()).unwrap();
        assert!(form.finish().is_err());
    }

    #[test]
    fn form_collects_fields() {
        let mut form = ProductForm::default();
        for (field, value) in [
            ("name", "Shirt"),
            ("price", " 4500 "),
            ("category", "Men"),
            ("subCategory", "Topwear"),
            ("sizes", r#"["M","L"]"#),
            ("bestseller", "true"),
        ] {
            form.set(field, value.into()).unwrap();
        }
        let (product, files) = form.finish().unwrap();
        assert_eq!(product.price, 4500);
        assert_eq!(product.sub_category, "Topwear");
        assert_eq!(product.sizes, vec!["M", "L"]);
        assert!(product.bestseller);
        assert!(files.is_empty());
    }

    #[test]
    fn too_many_images_rejected_before_storage() {
        let mut form = ProductForm::default();
        form.set("price", "100".into()).unwrap();
        form.images = vec![(Some("a.png".into()), Bytes::from_static(b"x")); MAX_IMAGES + 1];
        assert!(matches!(form.finish(), Err(AppError::BadRequest(ref m)) if m.contains("At most")));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut form = ProductForm::default();
        assert!(form.set("stock", "3".into()).is_err());
    }
}
