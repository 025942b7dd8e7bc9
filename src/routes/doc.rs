use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartData,
    dto::{
        auth::{LoginRequest, RegisterRequest, TokenResponse, UpdateProfileRequest},
        cart::{AddToCartRequest, CartResponse, MergeCartRequest, UpdateCartRequest},
        orders::{
            DeleteOrderRequest, OrderList, PlaceOrderRequest, PlaceOrderResponse,
            UpdateStatusRequest,
        },
        products::{AddProductForm, ProductIdRequest, ProductList},
    },
    middleware::auth::TOKEN_HEADER,
    models::{Order, Product, UserProfile},
    order::{OrderLineItem, OrderStatus, PaymentMethod},
    response::{ApiResponse, Meta},
    routes::{cart, health, orders, products, user},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                TOKEN_HEADER,
                "Session token returned by login, register or admin login",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        user::register,
        user::login,
        user::admin_login,
        user::get_profile,
        user::update_profile,
        products::list_products,
        products::single_product,
        products::add_product,
        products::remove_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart,
        cart::merge_cart,
        orders::place_order,
        orders::user_orders,
        orders::list_orders,
        orders::update_status,
        orders::delete_order
    ),
    components(
        schemas(
            UserProfile,
            Product,
            Order,
            OrderLineItem,
            OrderStatus,
            PaymentMethod,
            CartData,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UpdateProfileRequest,
            ProductIdRequest,
            ProductList,
            AddProductForm,
            AddToCartRequest,
            UpdateCartRequest,
            MergeCartRequest,
            CartResponse,
            PlaceOrderRequest,
            PlaceOrderResponse,
            UpdateStatusRequest,
            DeleteOrderRequest,
            OrderList,
            health::HealthData,
            Meta,
            ApiResponse<TokenResponse>,
            ApiResponse<UserProfile>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartResponse>,
            ApiResponse<PlaceOrderResponse>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoint"),
        (name = "User", description = "Registration, login and profile"),
        (name = "Products", description = "Public catalogue"),
        (name = "Cart", description = "Signed-in shopper cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Administrator endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
