use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

use crate::{
    response::ApiResponse,
    services::upload_service::UPLOAD_URL_PREFIX,
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;
pub mod role;
pub mod support;
pub mod upload;
pub mod users;

pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/profile", profile::router())
        .nest("/favorites", favorites::router())
        .nest("/role", role::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
        .nest("/support", support::router())
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT))
        .nest("/upload", upload::router(upload_max_bytes))
}

/// Full application: health, `/api`, docs and uploaded files. Cross-cutting
/// layers (tracing, request ids, CORS) are added by the server binary.
pub fn create_app(state: AppState, upload_max_bytes: usize) -> Router {
    let uploads = ServeDir::new(&state.upload_dir);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(upload_max_bytes))
        .nest_service(UPLOAD_URL_PREFIX, uploads)
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::failure("Not Found", serde_json::json!({ "path": uri.path() }));
    (StatusCode::NOT_FOUND, Json(body))
}
