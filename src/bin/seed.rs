use anyhow::Context;
use serde_json::json;
use storefront_api::{
    db::{create_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

const DEMO_EMAIL: &str = "shopper@example.com";
const DEMO_PASSWORD: &str = "shopper123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let user_id = ensure_shopper(&pool, "Demo Shopper", DEMO_EMAIL, DEMO_PASSWORD).await?;
    let inserted = seed_products(&pool).await?;

    println!("Seed completed. Shopper ID: {user_id}, new products: {inserted}");
    Ok(())
}

async fn ensure_shopper(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured shopper {email}");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<u64> {
    let products = [
        ("Cotton Crew Tee", "Soft everyday t-shirt", 1999_i64, "Men", "Topwear", json!(["S", "M", "L", "XL"]), true),
        ("Slim Fit Chinos", "Stretch twill trousers", 4599, "Men", "Bottomwear", json!(["M", "L", "XL"]), false),
        ("Linen Blouse", "Relaxed summer blouse", 3499, "Women", "Topwear", json!(["XS", "S", "M"]), true),
        ("Puffer Jacket", "Lightweight insulated jacket", 8999, "Women", "Winterwear", json!(["S", "M", "L"]), false),
        ("Kids Hoodie", "Fleece hoodie with front pocket", 2499, "Kids", "Topwear", json!(["S", "M"]), false),
    ];

    let mut inserted = 0;
    for (name, desc, price, category, sub_category, sizes, bestseller) in products {
        let result = sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, category, sub_category, sizes, images, bestseller)
            SELECT $1, $2, $3, $4, $5, $6, $7, '[]'::jsonb, $8
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(category)
        .bind(sub_category)
        .bind(sizes)
        .bind(bestseller)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    println!("Seeded products");
    Ok(inserted)
}
