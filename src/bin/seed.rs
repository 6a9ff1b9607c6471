use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    middleware::auth::{ADMIN_ROLE, USER_ROLE},
    services::{auth_service::hash_password, role_service::grant_role_unchecked},
};
use chrono::Utc;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 1).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", &[ADMIN_ROLE, USER_ROLE]).await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", &[USER_ROLE]).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    roles: &[&str],
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    let user_id = match existing {
        Some((id,)) => id,
        None => {
            let password_hash = hash_password(password)?;
            let now = Utc::now();
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO users (id, email, password_hash, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                "#,
            )
            .bind(id)
            .bind(email)
            .bind(password_hash)
            .bind(now)
            .execute(pool)
            .await?;
            id
        }
    };

    for role in roles {
        grant_role_unchecked(pool, user_id, role).await?;
    }

    println!("Ensured user {email} (roles={})", roles.join(","));
    Ok(user_id)
}

async fn seed_catalog(pool: &DbPool) -> anyhow::Result<()> {
    let categories = [
        ("Apparel", "Clothing and accessories"),
        ("Kitchen", "Mugs, bottles and more"),
        ("Books", "Printed and digital reading"),
    ];
    for (name, description) in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    let products = [
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550000_i64, 50_i32, "Apparel"),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120000, 100, "Kitchen"),
        ("Rust Sticker Pack", "Decorate your laptop", 50000, 200, "Apparel"),
        ("E-book: Async Rust", "Learn async Rust patterns", 250000, 75, "Books"),
    ];

    for (name, description, price, stock, category) in products {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, description, price, stock, is_active, created_at, updated_at)
            VALUES ($1, (SELECT id FROM categories WHERE name = $2), $3, $4, $5, $6, 1, $7, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(now)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories and products");
    Ok(())
}
