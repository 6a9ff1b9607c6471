use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::record,
    db::{self, DbPool},
    dto::cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
};

/// Upper bound for a single cart line, whether set directly or reached by
/// repeated adds.
pub const MAX_CART_QUANTITY: i32 = 10_000;

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    category_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    is_active: bool,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartWithProductRow> for CartItemDto {
    type Error = AppError;

    fn try_from(row: CartWithProductRow) -> AppResult<Self> {
        Ok(Self {
            id: row.cart_id,
            subtotal: line_total(row.price, row.quantity)?,
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                category_id: row.category_id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                is_active: row.is_active,
                image_url: row.image_url,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
    }
}

/// `price * quantity` in minor units, refusing to wrap.
pub(crate) fn line_total(price: i64, quantity: i32) -> AppResult<i64> {
    price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::BadRequest("order amount is too large".into()))
}

pub(crate) fn sum_amounts(amounts: impl IntoIterator<Item = i64>) -> AppResult<i64> {
    amounts
        .into_iter()
        .try_fold(0i64, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| AppError::BadRequest("order amount is too large".into()))
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if quantity > MAX_CART_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must not exceed {MAX_CART_QUANTITY}"
        )));
    }
    Ok(())
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = db::all(
        pool,
        sqlx::query_as::<_, CartWithProductRow>(
            r#"
            SELECT ci.id AS cart_id, ci.quantity,
                   p.id AS product_id, p.category_id, p.name, p.description, p.price,
                   p.stock, p.is_active, p.image_url, p.created_at, p.updated_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at DESC
            "#,
        )
        .bind(user.user_id),
    )
    .await?;

    let items = rows
        .into_iter()
        .map(CartItemDto::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    let total_amount = sum_amounts(items.iter().map(|item| item.subtotal))?;
    let meta = Meta::single_page(items.len());
    Ok(ApiResponse::success(
        "OK",
        CartList {
            items,
            total_amount,
        },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let quantity = payload.quantity.unwrap_or(1);
    validate_quantity(quantity)?;

    ensure_product_available(pool, payload.product_id).await?;

    let now = Utc::now();
    // one row per (user, product): a second add bumps the quantity, unless the
    // sum would pass the cap, in which case nothing is written or returned
    let cart_item = db::get(
        pool,
        sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + excluded.quantity,
                          updated_at = excluded.updated_at
            WHERE cart_items.quantity + excluded.quantity <= $6
            RETURNING id, product_id, user_id, quantity, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(payload.product_id)
        .bind(quantity)
        .bind(now)
        .bind(MAX_CART_QUANTITY),
    )
    .await?
    .ok_or_else(|| {
        AppError::BadRequest(format!(
            "cart quantity for this product must not exceed {MAX_CART_QUANTITY}"
        ))
    })?;

    record(
        pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn update_cart_item(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    validate_quantity(payload.quantity)?;

    let cart_item = db::get(
        pool,
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity = $3, updated_at = $4
            WHERE user_id = $1 AND product_id = $2
            RETURNING id, product_id, user_id, quantity, created_at, updated_at
            "#,
        )
        .bind(user.user_id)
        .bind(product_id)
        .bind(payload.quantity)
        .bind(Utc::now()),
    )
    .await?
    .ok_or(AppError::NotFound)?;

    record(
        pool,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let affected = db::run(
        pool,
        sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
            .bind(product_id)
            .bind(user.user_id),
    )
    .await?;

    if affected == 0 {
        return Err(AppError::NotFound);
    }

    record(
        pool,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = db::run(
        pool,
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user.user_id),
    )
    .await?;

    record(
        pool,
        user.user_id,
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": removed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    ))
}

async fn ensure_product_available(pool: &DbPool, product_id: Uuid) -> AppResult<()> {
    let product: Option<(bool,)> = db::get(
        pool,
        sqlx::query_as("SELECT is_active FROM products WHERE id = $1").bind(product_id),
    )
    .await?;
    match product {
        None => Err(AppError::BadRequest("product not found".to_string())),
        Some((false,)) => Err(AppError::BadRequest("product is not available".to_string())),
        Some((true,)) => Ok(()),
    }
}
