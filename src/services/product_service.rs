use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::record,
    db::like_contains,
    dto::products::{CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
    entity::{
        categories::Entity as Categories,
        product_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages,
            Model as ImageModel,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// Public catalog: active products only.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    query_products(state, query, false).await
}

/// Admin catalog view, including inactive products.
pub async fn list_all_products(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(&state.pool, user).await?;
    query_products(state, query, true).await
}

async fn query_products(
    state: &AppState,
    query: ProductQuery,
    include_inactive: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if !include_inactive {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        // SQLite LIKE is case-insensitive for ASCII
        condition = condition.add(
            Condition::any()
                .add(Column::Name.like(like_contains(search)))
                .add(Column::Description.like(like_contains(search))),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let detail = load_detail(state, id, false).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

pub async fn get_product_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(&state.pool, user).await?;
    let detail = load_detail(state, id, true).await?;
    Ok(ApiResponse::success("Product", detail, None))
}

async fn load_detail(state: &AppState, id: Uuid, include_inactive: bool) -> AppResult<ProductDetail> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|p| include_inactive || p.is_active)
        .ok_or(AppError::NotFound)?;
    let images = load_images(&state.orm, id).await?;
    Ok(ProductDetail {
        product: product_from_entity(product),
        images,
    })
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(&state.pool, user).await?;
    let name = required_name(&payload.name)?;
    validate_amounts(Some(payload.price), Some(payload.stock))?;
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category_id),
        name: Set(name),
        description: Set(clean_optional(payload.description)),
        price: Set(payload.price),
        stock: Set(payload.stock),
        is_active: Set(payload.is_active.unwrap_or(true)),
        image_url: Set(clean_optional(payload.image_url)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    let images = replace_images(&txn, product.id, &payload.images).await?;
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        ProductDetail {
            product: product_from_entity(product),
            images,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(&state.pool, user).await?;
    validate_amounts(payload.price, payload.stock)?;
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(name) = payload.name {
        active.name = Set(required_name(&name)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(clean_optional(Some(description)));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(clean_optional(Some(image_url)));
    }
    active.updated_at = Set(Utc::now());

    let txn = state.orm.begin().await?;
    let product = active.update(&txn).await?;
    let images = match payload.images {
        Some(urls) => replace_images(&txn, id, &urls).await?,
        None => load_images(&txn, id).await?,
    };
    txn.commit().await?;

    record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        ProductDetail {
            product: product_from_entity(product),
            images,
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(&state.pool, user).await?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn load_images<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<Vec<ProductImage>> {
    let images = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product_id))
        .order_by_asc(ImageCol::Position)
        .all(conn)
        .await?
        .into_iter()
        .map(image_from_entity)
        .collect();
    Ok(images)
}

async fn replace_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: &[String],
) -> AppResult<Vec<ProductImage>> {
    ProductImages::delete_many()
        .filter(ImageCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;

    let now = Utc::now();
    let mut images = Vec::with_capacity(urls.len());
    let urls = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty());
    for (position, url) in urls.enumerate() {
        let image = ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(url.to_string()),
            position: Set(position as i32),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;
        images.push(image_from_entity(image));
    }
    Ok(images)
}

async fn ensure_category_exists(state: &AppState, category_id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("category not found".into()));
    }
    Ok(())
}

/// Prices are minor currency units.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

fn validate_amounts(price: Option<i64>, stock: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if price.is_some_and(|p| p > MAX_PRICE) {
        return Err(AppError::BadRequest(format!(
            "price must not exceed {MAX_PRICE}"
        )));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    Ok(())
}

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(name.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        is_active: model.is_active,
        image_url: model.image_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn image_from_entity(model: ImageModel) -> ProductImage {
    ProductImage {
        id: model.id,
        product_id: model.product_id,
        url: model.url,
        position: model.position,
    }
}
