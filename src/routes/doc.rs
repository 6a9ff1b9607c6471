use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemDto, CartList, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        favorites::{AddFavoriteRequest, FavoriteProductList},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{
            CreateProductRequest, InventoryAdjustRequest, ProductDetail, ProductList,
            UpdateProductRequest,
        },
        profile::{ChangePasswordRequest, UpdateProfileRequest},
        support::{ChatList, MessageList, PostMessageRequest},
        users::{GrantRoleRequest, RoleInfo, UserList},
    },
    models::{
        CartItem, Category, Favorite, Order, OrderItem, Product, ProductImage, Profile,
        SupportChat, SupportMessage,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, categories, favorites, health, orders, params, products, profile,
        role, support, upload, users,
    },
    services::upload_service::UploadedFile,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        profile::get_profile,
        profile::update_profile,
        profile::change_password,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        role::my_roles,
        users::list_users,
        users::get_user,
        users::update_user,
        users::user_roles,
        users::grant_role,
        users::revoke_role,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_all_products,
        admin::get_product_admin,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_support_chats,
        admin::reply_support_chat,
        support::open_chat,
        support::list_chats,
        support::list_messages,
        support::post_message,
        support::close_chat,
        upload::upload_image
    ),
    components(
        schemas(
            Profile,
            Category,
            Product,
            ProductImage,
            Favorite,
            CartItem,
            Order,
            OrderItem,
            SupportChat,
            SupportMessage,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemDto,
            CartList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            AddFavoriteRequest,
            FavoriteProductList,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            InventoryAdjustRequest,
            ProductDetail,
            ProductList,
            UpdateProfileRequest,
            ChangePasswordRequest,
            PostMessageRequest,
            ChatList,
            MessageList,
            GrantRoleRequest,
            RoleInfo,
            UserList,
            UploadedFile,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            params::UserListQuery,
            params::ChatListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and current user"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Profile", description = "Own profile and password"),
        (name = "Favorites", description = "Favorite products"),
        (name = "Users", description = "Roles and user administration"),
        (name = "Admin", description = "Order, inventory and support administration"),
        (name = "Support", description = "Support chat"),
        (name = "Upload", description = "Image upload"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
