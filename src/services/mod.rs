pub mod auth_service;
pub mod cart_service;
pub mod image_store;
pub mod order_service;
pub mod product_service;
