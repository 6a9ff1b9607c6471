mod common;

use storefront_api::{
    dto::{
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        products::{InventoryAdjustRequest, UpdateProductRequest},
        profile::UpdateProfileRequest,
    },
    error::AppError,
    routes::params::{LowStockQuery, OrderListQuery},
    services::{
        admin_service, cart_service::{self, MAX_CART_QUANTITY}, order_service, product_service,
        profile_service,
    },
    state::AppState,
};

// user adds to cart -> checkout; admin updates status and sees low stock
#[tokio::test]
async fn checkout_snapshots_prices_and_admin_flow() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "user@example.com", false).await?;
    let admin = common::create_user(&state, "admin@example.com", true).await?;

    let widget = common::create_product(&state, &admin, "Test Widget", 1000, 10).await?;
    let gadget = common::create_product(&state, &admin, "Test Gadget", 250, 3).await?;

    // adding the same product twice bumps the quantity on one row
    for quantity in [Some(2), None] {
        cart_service::add_to_cart(
            &state.pool,
            &user,
            AddToCartRequest {
                product_id: widget.id,
                quantity,
            },
        )
        .await?;
    }
    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: gadget.id,
            quantity: Some(3),
        },
    )
    .await?;

    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);
    let widget_line = cart
        .items
        .iter()
        .find(|item| item.product.id == widget.id)
        .expect("widget line");
    assert_eq!(widget_line.quantity, 3);
    assert_eq!(cart.total_amount, 3 * 1000 + 3 * 250);

    let placed = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address: Some("1 Main St".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.total_amount, 3750);
    assert_eq!(placed.order.address, "1 Main St");
    assert!(placed.order.invoice_number.starts_with("INV-"));
    assert_eq!(placed.items.len(), 2);

    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_amount, 0);

    let widget_now = product_service::get_product(&state, widget.id)
        .await?
        .data
        .expect("widget")
        .product;
    assert_eq!(widget_now.stock, 7);

    // later price change must not touch the order
    product_service::update_product(
        &state,
        &admin,
        widget.id,
        UpdateProductRequest {
            price: Some(5000),
            ..Default::default()
        },
    )
    .await?;

    let fetched = order_service::get_order(&state, &user, placed.order.id)
        .await?
        .data
        .expect("order");
    let line = fetched
        .items
        .iter()
        .find(|item| item.product_id == Some(widget.id))
        .expect("widget item");
    assert_eq!(line.price, 1000);
    assert_eq!(line.quantity, 3);
    assert_eq!(line.product_name, "Test Widget");
    assert_eq!(fetched.order.total_amount, 3750);

    let updated = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "paid".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(updated.status, "paid");

    let bad_status = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "teleported".into(),
        },
    )
    .await;
    assert!(matches!(bad_status, Err(AppError::BadRequest(_))));

    // gadget sold out, widget at 7
    let low = admin_service::list_low_stock(&state, &admin, LowStockQuery::default())
        .await?
        .data
        .expect("low stock");
    let ids: Vec<_> = low.items.iter().map(|p| p.id).collect();
    assert!(ids.contains(&gadget.id));
    assert!(!ids.contains(&widget.id));

    let all = admin_service::list_all_orders(&state, &admin, OrderListQuery::default())
        .await?;
    assert_eq!(all.meta.and_then(|m| m.total), Some(1));

    let forbidden = admin_service::list_all_orders(&state, &user, OrderListQuery::default()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_missing_address() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "buyer@example.com", false).await?;
    let admin = common::create_user(&state, "boss@example.com", true).await?;

    let empty = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address: Some("Somewhere".into()),
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let product = common::create_product(&state, &admin, "Lamp", 300, 5).await?;
    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(1),
        },
    )
    .await?;

    let no_address = order_service::checkout(&state, &user, CheckoutRequest::default()).await;
    assert!(matches!(no_address, Err(AppError::BadRequest(_))));

    // profile address is used when the request omits one
    profile_service::update_profile(
        &state.pool,
        &user,
        UpdateProfileRequest {
            address: Some("42 Profile Road".into()),
            ..Default::default()
        },
    )
    .await?;
    let order = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await?
        .data
        .expect("order");
    assert_eq!(order.order.address, "42 Profile Road");

    Ok(())
}

#[tokio::test]
async fn checkout_with_insufficient_stock_changes_nothing() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "greedy@example.com", false).await?;
    let admin = common::create_user(&state, "stock@example.com", true).await?;

    let plenty = common::create_product(&state, &admin, "Plenty", 100, 50).await?;
    let scarce = common::create_product(&state, &admin, "Scarce", 100, 5).await?;

    for (product_id, quantity) in [(plenty.id, 2), (scarce.id, 3)] {
        cart_service::add_to_cart(
            &state.pool,
            &user,
            AddToCartRequest {
                product_id,
                quantity: Some(quantity),
            },
        )
        .await?;
    }

    // stock drops below the cart quantity after the item was added
    admin_service::adjust_inventory(&state, &admin, scarce.id, InventoryAdjustRequest { delta: -4 })
        .await?;

    let result = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address: Some("Nowhere".into()),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);

    let plenty_now = product_service::get_product(&state, plenty.id)
        .await?
        .data
        .expect("product")
        .product;
    assert_eq!(plenty_now.stock, 50);

    let orders = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert_eq!(orders.data.expect("orders").items.len(), 0);

    Ok(())
}

#[tokio::test]
async fn cancel_restores_stock_only_while_pending() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "fickle@example.com", false).await?;
    let admin = common::create_user(&state, "ops@example.com", true).await?;
    let product = common::create_product(&state, &admin, "Kettle", 900, 4).await?;

    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(4),
        },
    )
    .await?;
    let placed = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address: Some("Home".into()),
        },
    )
    .await?
    .data
    .expect("order");

    let cancelled = order_service::cancel_order(&state, &user, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.order.status, "cancelled");

    let restored = product_service::get_product(&state, product.id)
        .await?
        .data
        .expect("product")
        .product;
    assert_eq!(restored.stock, 4);

    let again = order_service::cancel_order(&state, &user, placed.order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    // other users cannot see the order
    let stranger = common::create_user(&state, "stranger@example.com", false).await?;
    let hidden = order_service::get_order(&state, &stranger, placed.order.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn cart_quantity_rules() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "carter@example.com", false).await?;
    let admin = common::create_user(&state, "cartadmin@example.com", true).await?;
    let product = common::create_product(&state, &admin, "Spoon", 50, 100).await?;

    let zero = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(0),
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let missing = cart_service::update_cart_item(
        &state.pool,
        &user,
        product.id,
        UpdateCartItemRequest { quantity: 2 },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: None,
        },
    )
    .await?;
    let set = cart_service::update_cart_item(
        &state.pool,
        &user,
        product.id,
        UpdateCartItemRequest { quantity: 7 },
    )
    .await?
    .data
    .expect("cart item");
    assert_eq!(set.quantity, 7);

    let negative = cart_service::update_cart_item(
        &state.pool,
        &user,
        product.id,
        UpdateCartItemRequest { quantity: -1 },
    )
    .await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))));

    cart_service::remove_from_cart(&state.pool, &user, product.id).await?;
    let gone = cart_service::remove_from_cart(&state.pool, &user, product.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    // inactive products cannot be added
    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    let inactive = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(1),
        },
    )
    .await;
    assert!(matches!(inactive, Err(AppError::BadRequest(_))));

    Ok(())
}

async fn stock_of(state: &AppState, product_id: uuid::Uuid) -> anyhow::Result<i32> {
    Ok(product_service::get_product(state, product_id)
        .await?
        .data
        .expect("product")
        .product
        .stock)
}

async fn place_order(
    state: &AppState,
    user: &storefront_api::middleware::auth::AuthUser,
    items: &[(uuid::Uuid, i32)],
) -> anyhow::Result<storefront_api::dto::orders::OrderWithItems> {
    for &(product_id, quantity) in items {
        cart_service::add_to_cart(
            &state.pool,
            user,
            AddToCartRequest {
                product_id,
                quantity: Some(quantity),
            },
        )
        .await?;
    }
    let placed = order_service::checkout(
        state,
        user,
        CheckoutRequest {
            address: Some("7 Depot Lane".into()),
        },
    )
    .await?
    .data
    .expect("order");
    Ok(placed)
}

fn set_status(status: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: status.to_string(),
    }
}

#[tokio::test]
async fn cancelled_orders_cannot_be_reopened() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "reopen@example.com", false).await?;
    let admin = common::create_user(&state, "reopen-admin@example.com", true).await?;
    let product = common::create_product(&state, &admin, "Teapot", 1200, 5).await?;

    let placed = place_order(&state, &user, &[(product.id, 3)]).await?;
    assert_eq!(stock_of(&state, product.id).await?, 2);

    order_service::cancel_order(&state, &user, placed.order.id).await?;
    assert_eq!(stock_of(&state, product.id).await?, 5);

    for status in ["pending", "paid", "cancelled"] {
        let reopened =
            admin_service::update_order_status(&state, &admin, placed.order.id, set_status(status))
                .await;
        assert!(matches!(reopened, Err(AppError::BadRequest(_))), "{status}");
    }

    let again = order_service::cancel_order(&state, &user, placed.order.id).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product.id).await?, 5);

    Ok(())
}

#[tokio::test]
async fn admin_cancel_restores_stock_once() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "shipped@example.com", false).await?;
    let admin = common::create_user(&state, "warehouse@example.com", true).await?;
    let product = common::create_product(&state, &admin, "Colander", 800, 6).await?;

    let placed = place_order(&state, &user, &[(product.id, 4)]).await?;
    admin_service::update_order_status(&state, &admin, placed.order.id, set_status("paid"))
        .await?;
    assert_eq!(stock_of(&state, product.id).await?, 2);

    let cancelled =
        admin_service::update_order_status(&state, &admin, placed.order.id, set_status("cancelled"))
            .await?
            .data
            .expect("order");
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(stock_of(&state, product.id).await?, 6);

    // the user can no longer cancel, so nothing is restored twice
    let user_cancel = order_service::cancel_order(&state, &user, placed.order.id).await;
    assert!(matches!(user_cancel, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product.id).await?, 6);

    Ok(())
}

#[tokio::test]
async fn cart_quantity_is_capped() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "bulk@example.com", false).await?;
    let admin = common::create_user(&state, "bulk-admin@example.com", true).await?;
    let product = common::create_product(&state, &admin, "Napkin", 5, 10).await?;

    let add = |quantity: i32| AddToCartRequest {
        product_id: product.id,
        quantity: Some(quantity),
    };

    let huge = cart_service::add_to_cart(&state.pool, &user, add(i32::MAX)).await;
    assert!(matches!(huge, Err(AppError::BadRequest(_))));

    cart_service::add_to_cart(&state.pool, &user, add(MAX_CART_QUANTITY)).await?;
    let over = cart_service::add_to_cart(&state.pool, &user, add(1)).await;
    assert!(matches!(over, Err(AppError::BadRequest(_))));

    let set_over = cart_service::update_cart_item(
        &state.pool,
        &user,
        product.id,
        UpdateCartItemRequest {
            quantity: MAX_CART_QUANTITY + 1,
        },
    )
    .await;
    assert!(matches!(set_over, Err(AppError::BadRequest(_))));

    // the rejected adds left the row readable and unchanged
    let cart = cart_service::list_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, MAX_CART_QUANTITY);
    assert_eq!(cart.total_amount, 5 * i64::from(MAX_CART_QUANTITY));

    Ok(())
}

#[tokio::test]
async fn oversized_totals_are_rejected_not_wrapped() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "whale@example.com", false).await?;
    let admin = common::create_user(&state, "whale-admin@example.com", true).await?;
    let product = common::create_product(&state, &admin, "Yacht", 100, 5).await?;

    let too_expensive = product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            price: Some(i64::MAX / 2 + 1),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(too_expensive, Err(AppError::BadRequest(_))));

    cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: Some(2),
        },
    )
    .await?;

    // a price written outside the service layer still must not wrap
    sqlx::query("UPDATE products SET price = $1 WHERE id = $2")
        .bind(i64::MAX / 2 + 1)
        .bind(product.id)
        .execute(&state.pool)
        .await?;

    let cart = cart_service::list_cart(&state.pool, &user).await;
    assert!(matches!(cart, Err(AppError::BadRequest(_))));

    let order = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            address: Some("Marina".into()),
        },
    )
    .await;
    assert!(matches!(order, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product.id).await?, 5);

    Ok(())
}

#[tokio::test]
async fn order_lines_keep_cart_order() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let user = common::create_user(&state, "lines@example.com", false).await?;
    let admin = common::create_user(&state, "lines-admin@example.com", true).await?;

    let mut wanted = Vec::new();
    for name in ["Fork", "Knife", "Spoon", "Ladle"] {
        let product = common::create_product(&state, &admin, name, 100, 10).await?;
        wanted.push((product.id, 1));
    }

    let placed = place_order(&state, &user, &wanted).await?;
    let placed_names: Vec<_> = placed.items.iter().map(|i| i.product_name.clone()).collect();

    for _ in 0..3 {
        let fetched = order_service::get_order(&state, &user, placed.order.id)
            .await?
            .data
            .expect("order");
        let names: Vec<_> = fetched.items.iter().map(|i| i.product_name.clone()).collect();
        assert_eq!(names, placed_names);
    }

    Ok(())
}
