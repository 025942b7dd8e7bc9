mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use storefront_api::{
    app::build_app,
    cart::CartData,
    db::{create_pool, run_migrations},
    dto::{
        auth::RegisterRequest,
        cart::{AddToCartRequest, MergeCartRequest, UpdateCartRequest},
        orders::{DeleteOrderRequest, PlaceOrderRequest, UpdateStatusRequest},
        products::NewProduct,
    },
    entity::{orders, users},
    error::AppError,
    middleware::auth::{AdminUser, AuthUser, ROLE_ADMIN, TOKEN_HEADER, decode_claims},
    order::{OrderLineItem, OrderStatus, PaymentMethod},
    services::{auth_service, cart_service, order_service, product_service},
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

use common::{ADMIN_EMAIL, database_url, test_config};

// Shopper adds to cart, merges a guest cart, checks out; admin moves and deletes the order.
#[tokio::test]
async fn cart_checkout_and_admin_flow() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
        return Ok(());
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(pool, test_config(&database_url));
    let admin = AdminUser {
        email: ADMIN_EMAIL.into(),
    };

    // Shopper
    let tag = Uuid::new_v4().simple().to_string();
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Flow Shopper".into(),
            email: format!("flow-{tag}@example.com"),
            password: "flow-password".into(),
        },
    )
    .await?;
    let token = registered.data.expect("token").token;
    let claims = decode_claims(&token, &state.config.jwt_secret)?;
    let shopper = AuthUser {
        user_id: Uuid::parse_str(&claims.sub)?,
    };

    // Catalogue
    let product = product_service::create_product(
        &state,
        &admin,
        NewProduct {
            name: format!("Flow Tee {tag}"),
            description: "Integration product".into(),
            price: 2500,
            category: "Men".into(),
            sub_category: "Topwear".into(),
            sizes: vec!["M".into(), "L".into()],
            images: Vec::new(),
            bestseller: false,
        },
    )
    .await?
    .data
    .expect("product");
    let pid = product.id.to_string();

    // Add twice, then zero removes the product entry entirely
    for _ in 0..2 {
        cart_service::add_to_cart(&state, &shopper, add_req(&pid, "M")).await?;
    }
    let cart = cart_service::get_cart(&state, &shopper).await?.data.expect("cart").cart_data;
    assert_eq!(cart.quantity(&pid, "M"), 2);

    let cleared = cart_service::update_cart(
        &state,
        &shopper,
        UpdateCartRequest {
            item_id: pid.clone(),
            size: "M".into(),
            quantity: 0,
        },
    )
    .await?;
    assert!(cleared.data.expect("cart").cart_data.is_empty());

    // Updating a product that is no longer in the cart is refused
    let err = cart_service::update_cart(
        &state,
        &shopper,
        UpdateCartRequest {
            item_id: pid.clone(),
            size: "M".into(),
            quantity: 4,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Item not found in cart"));
    let cart = cart_service::get_cart(&state, &shopper).await?.data.expect("cart").cart_data;
    assert!(cart.is_empty());

    // Missing size is rejected without touching the cart
    let err = cart_service::add_to_cart(&state, &shopper, add_req(&pid, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Please select product size"));

    // Merge is additive per key; an empty guest cart is a successful no-op
    cart_service::add_to_cart(&state, &shopper, add_req(&pid, "M")).await?;
    let mut guest = CartData::new();
    guest.set_quantity(&pid, "M", 2)?;
    guest.set_quantity(&pid, "L", 1)?;
    let merged = cart_service::merge_cart(&state, &shopper, MergeCartRequest { guest_cart: guest })
        .await?;
    assert_eq!(merged.message, "Guest cart merged successfully");
    let merged = merged.data.expect("cart").cart_data;
    assert_eq!(merged.quantity(&pid, "M"), 3);
    assert_eq!(merged.quantity(&pid, "L"), 1);

    let noop = cart_service::merge_cart(&state, &shopper, MergeCartRequest::default()).await?;
    assert!(noop.success);
    assert_eq!(noop.message, "No guest cart to merge");
    assert_eq!(noop.data.expect("cart").cart_data, merged);

    // A disallowed payment method persists nothing
    let lines: Vec<OrderLineItem> = merged
        .lines()
        .map(|line| OrderLineItem::snapshot(&product, line.size, line.quantity))
        .collect();
    let amount = merged.amount_total(std::slice::from_ref(&product)) + 1000;
    let mut bad = PlaceOrderRequest::new(&lines, amount, "12 Harbour Road", PaymentMethod::CashOnDelivery)?;
    bad.payment_method = Some("CASH_APP".into());
    let err = order_service::place_order(&state, &shopper, bad).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("Allowed: COD, BANK_TRANSFER")));
    assert_eq!(count_orders(&state, shopper.user_id).await?, 0);

    // Valid checkout empties the server cart
    let request = PlaceOrderRequest::new(&lines, amount, "12 Harbour Road", PaymentMethod::BankTransfer)?;
    let placed = order_service::place_order(&state, &shopper, request).await?;
    let order_id = placed.data.expect("order id").order_id;
    let cart = cart_service::get_cart(&state, &shopper).await?.data.expect("cart").cart_data;
    assert!(cart.is_empty());

    let mine = order_service::list_user_orders(&state, &shopper).await?.data.expect("orders");
    assert_eq!(mine.items.len(), 1);
    let order = &mine.items[0];
    assert_eq!(order.id, order_id);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(!order.payment);
    assert_eq!(order.amount, 2500 * 4 + 1000);

    // Status moves freely, backwards included
    for status in ["shipped", "pending", "cancelled"] {
        let updated = order_service::update_status(
            &state,
            &admin,
            UpdateStatusRequest {
                order_id: Some(order_id),
                status: status.into(),
            },
        )
        .await?;
        assert_eq!(updated.data.expect("order").status.as_str(), status);
    }
    let err = order_service::update_status(
        &state,
        &admin,
        UpdateStatusRequest {
            order_id: Some(order_id),
            status: "lost".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let all = order_service::list_all_orders(&state, &admin).await?.data.expect("orders");
    assert!(all.items.iter().any(|o| o.id == order_id));

    // Delete, then the id no longer resolves
    order_service::delete_order(&state, &admin, DeleteOrderRequest { order_id: Some(order_id) }).await?;
    let err = order_service::delete_order(&state, &admin, DeleteOrderRequest { order_id: Some(order_id) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Cleanup
    product_service::remove_product(&state, &admin, product.id).await?;
    users::Entity::delete_by_id(shopper.user_id).exec(&state.orm).await?;

    Ok(())
}

#[tokio::test]
async fn products_may_share_a_name() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
        return Ok(());
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(pool, test_config(&database_url));
    let admin = AdminUser {
        email: ADMIN_EMAIL.into(),
    };

    let name = format!("Twin Tee {}", Uuid::new_v4().simple());
    let mut ids = Vec::new();
    for price in [1500, 1800] {
        let product = product_service::create_product(
            &state,
            &admin,
            NewProduct {
                name: name.clone(),
                description: "Same name, different listing".into(),
                price,
                category: "Women".into(),
                sub_category: "Topwear".into(),
                sizes: vec!["S".into()],
                images: Vec::new(),
                bestseller: false,
            },
        )
        .await?
        .data
        .expect("product");
        ids.push(product.id);
    }
    assert_ne!(ids[0], ids[1]);

    for id in ids {
        product_service::remove_product(&state, &admin, id).await?;
    }
    Ok(())
}

#[tokio::test]
async fn removing_unknown_product_is_not_found() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
        return Ok(());
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(pool, test_config(&database_url));
    let token = auth_service::issue_token(&state.config, ADMIN_EMAIL, ROLE_ADMIN)?;

    let request = Request::post("/api/products/remove")
        .header(header::CONTENT_TYPE, "application/json")
        .header(TOKEN_HEADER, token)
        .body(Body::from(json!({ "id": Uuid::new_v4() }).to_string()))?;
    let response = build_app(state).oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Product not found");
    Ok(())
}

fn add_req(item_id: &str, size: &str) -> AddToCartRequest {
    AddToCartRequest {
        item_id: item_id.to_owned(),
        size: size.to_owned(),
    }
}

async fn count_orders(state: &AppState, user_id: Uuid) -> anyhow::Result<usize> {
    let rows = orders::Entity::find()
        .filter(orders::Column::UserId.eq(user_id))
        .all(&state.orm)
        .await?;
    Ok(rows.len())
}
