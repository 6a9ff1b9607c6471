mod common;

use storefront_api::{
    dto::{
        categories::CreateCategoryRequest,
        favorites::AddFavoriteRequest,
        products::{CreateProductRequest, UpdateProductRequest},
    },
    error::AppError,
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder, UserListQuery},
    services::{category_service, favorite_service, product_service, user_service},
};

#[tokio::test]
async fn product_create_then_get_returns_same_fields() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "catalog@example.com", true).await?;

    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Drinkware".into(),
            description: Some("Cups and mugs".into()),
        },
    )
    .await?
    .data
    .expect("category");

    let created = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            category_id: Some(category.id),
            name: "Ferris Mug".into(),
            description: Some("Coffee tastes better with Ferris".into()),
            price: 120_000,
            stock: 40,
            is_active: Some(true),
            image_url: Some("/uploads/mug.png".into()),
            images: vec!["/uploads/mug-1.png".into(), "/uploads/mug-2.png".into()],
        },
    )
    .await?
    .data
    .expect("created");

    let fetched = product_service::get_product(&state, created.product.id)
        .await?
        .data
        .expect("fetched");

    assert_eq!(fetched.product, created.product);
    assert_eq!(fetched.product.category_id, Some(category.id));
    assert_eq!(fetched.images, created.images);
    assert_eq!(fetched.images.len(), 2);
    assert_eq!(fetched.images[0].url, "/uploads/mug-1.png");
    assert_eq!(fetched.images[1].position, 1);

    Ok(())
}

#[tokio::test]
async fn product_validation_and_visibility() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "validator@example.com", true).await?;
    let user = common::create_user(&state, "shopper@example.com", false).await?;

    let negative = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            category_id: None,
            name: "Broken".into(),
            description: None,
            price: -5,
            stock: 1,
            is_active: None,
            image_url: None,
            images: Vec::new(),
        },
    )
    .await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))));

    let not_admin = common::create_product(&state, &user, "Sneaky", 1, 1).await;
    assert!(not_admin.is_err());

    let hidden = common::create_product(&state, &admin, "Hidden", 10, 1).await?;
    product_service::update_product(
        &state,
        &admin,
        hidden.id,
        UpdateProductRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let public = product_service::get_product(&state, hidden.id).await;
    assert!(matches!(public, Err(AppError::NotFound)));
    let admin_view = product_service::get_product_admin(&state, &admin, hidden.id).await?;
    assert!(!admin_view.data.expect("detail").product.is_active);

    let listed = product_service::list_products(&state, ProductQuery::default())
        .await?
        .data
        .expect("list");
    assert!(listed.items.iter().all(|p| p.id != hidden.id));

    let listed_all = product_service::list_all_products(&state, &admin, ProductQuery::default())
        .await?
        .data
        .expect("list");
    assert!(listed_all.items.iter().any(|p| p.id == hidden.id));

    product_service::delete_product(&state, &admin, hidden.id).await?;
    let deleted_again = product_service::delete_product(&state, &admin, hidden.id).await;
    assert!(matches!(deleted_again, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn product_list_filters_and_sorts() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "filters@example.com", true).await?;

    common::create_product(&state, &admin, "Blue Hoodie", 500, 5).await?;
    common::create_product(&state, &admin, "Red Hoodie", 700, 5).await?;
    common::create_product(&state, &admin, "Sticker", 50, 5).await?;

    let hoodies = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("hoodie".into()),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(hoodies.meta.as_ref().and_then(|m| m.total), Some(2));
    let names: Vec<_> = hoodies
        .data
        .expect("list")
        .items
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Blue Hoodie", "Red Hoodie"]);

    let cheap = product_service::list_products(
        &state,
        ProductQuery {
            max_price: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(cheap.items.len(), 1);
    assert_eq!(cheap.items[0].name, "Sticker");

    let paged = product_service::list_products(
        &state,
        ProductQuery {
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(paged.data.expect("list").items.len(), 1);
    let meta = paged.meta.expect("meta");
    assert_eq!((meta.page, meta.per_page, meta.total), (Some(2), Some(2), Some(3)));

    Ok(())
}

#[tokio::test]
async fn categories_reject_duplicates() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "cats@example.com", true).await?;

    let request = || CreateCategoryRequest {
        name: "Books".into(),
        description: None,
    };
    let books = category_service::create_category(&state, &admin, request())
        .await?
        .data
        .expect("category");
    let duplicate = category_service::create_category(&state, &admin, request()).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let listed = category_service::list_categories(&state)
        .await?
        .data
        .expect("categories");
    assert_eq!(listed.items.len(), 1);

    category_service::delete_category(&state, &admin, books.id).await?;
    let gone = category_service::get_category(&state, books.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn favorites_are_idempotent() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "favadmin@example.com", true).await?;
    let user = common::create_user(&state, "fan@example.com", false).await?;
    let product = common::create_product(&state, &admin, "Poster", 80, 10).await?;

    let first = favorite_service::add_favorite(
        &state.pool,
        &user,
        AddFavoriteRequest {
            product_id: product.id,
        },
    )
    .await?
    .data
    .expect("favorite");
    let second = favorite_service::add_favorite(
        &state.pool,
        &user,
        AddFavoriteRequest {
            product_id: product.id,
        },
    )
    .await?
    .data
    .expect("favorite");
    assert_eq!(first.id, second.id);

    let listed = favorite_service::list_favorites(&state.pool, &user, Pagination::default()).await?;
    assert_eq!(listed.meta.and_then(|m| m.total), Some(1));

    favorite_service::remove_favorite(&state.pool, &user, product.id).await?;
    let again = favorite_service::remove_favorite(&state.pool, &user, product.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "search_admin@example.com", true).await?;
    common::create_user(&state, "searchxadmin@example.com", false).await?;

    common::create_product(&state, &admin, "50% Off Mug", 500, 5).await?;
    common::create_product(&state, &admin, "Plain Mug", 400, 5).await?;
    common::create_product(&state, &admin, "snake_case Tee", 900, 5).await?;

    let search = |q: &str| ProductQuery {
        q: Some(q.to_string()),
        ..Default::default()
    };
    let names = |list: storefront_api::dto::products::ProductList| -> Vec<String> {
        list.items.into_iter().map(|p| p.name).collect()
    };

    let percent = product_service::list_products(&state, search("%")).await?;
    assert_eq!(names(percent.data.expect("list")), vec!["50% Off Mug"]);

    let underscore = product_service::list_products(&state, search("_")).await?;
    assert_eq!(names(underscore.data.expect("list")), vec!["snake_case Tee"]);

    let mugs = product_service::list_products(&state, search("MUG")).await?;
    assert_eq!(mugs.meta.and_then(|m| m.total), Some(2));

    // as a wildcard `_` would also match "searchxadmin"
    let users = user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            q: Some("search_admin".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("users");
    assert_eq!(users.items.len(), 1);
    assert_eq!(users.items[0].email, "search_admin@example.com");

    Ok(())
}
