#![allow(dead_code)]

use std::sync::Arc;

use storefront_api::{
    db::{create_memory_pool, run_migrations},
    dto::{auth::RegisterRequest, products::CreateProductRequest},
    middleware::auth::{ADMIN_ROLE, AuthUser},
    models::Product,
    services::{
        auth_service::register_user, product_service, role_service::grant_role_unchecked,
    },
    state::{AppState, JwtSettings},
};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "secret123";

/// Fresh in-memory database with migrations applied.
pub async fn test_state() -> anyhow::Result<AppState> {
    let pool = create_memory_pool().await?;
    run_migrations(&pool).await?;
    let jwt = JwtSettings {
        secret: Arc::from(TEST_SECRET),
        ttl_hours: 1,
    };
    let upload_dir = std::env::temp_dir().join(format!("storefront-test-{}", Uuid::new_v4()));
    Ok(AppState::new(pool, jwt, upload_dir))
}

pub async fn create_user(state: &AppState, email: &str, admin: bool) -> anyhow::Result<AuthUser> {
    let resp = register_user(
        &state.pool,
        RegisterRequest {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            name: None,
        },
    )
    .await?;
    let profile = resp.data.expect("registered profile");
    if admin {
        grant_role_unchecked(&state.pool, profile.id, ADMIN_ROLE).await?;
    }
    Ok(AuthUser {
        user_id: profile.id,
        email: profile.email,
    })
}

pub async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            category_id: None,
            name: name.to_string(),
            description: Some(format!("{name} for testing")),
            price,
            stock,
            is_active: None,
            image_url: None,
            images: Vec::new(),
        },
    )
    .await?;
    Ok(resp.data.expect("created product").product)
}
