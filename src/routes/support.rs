use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::support::{ChatList, MessageList, PostMessageRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{SupportChat, SupportMessage},
    response::ApiResponse,
    routes::params::Pagination,
    services::support_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chats", get(list_chats).post(open_chat))
        .route("/chats/{id}/messages", get(list_messages).post(post_message))
        .route("/chats/{id}/close", post(close_chat))
}

#[utoipa::path(
    post,
    path = "/api/support/chats",
    responses(
        (status = 200, description = "Open chat, created when none exists", body = ApiResponse<SupportChat>)
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn open_chat(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SupportChat>>> {
    Ok(Json(support_service::open_chat(&state.pool, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/support/chats",
    params(Pagination),
    responses(
        (status = 200, description = "Own chats", body = ApiResponse<ChatList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn list_chats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ChatList>>> {
    Ok(Json(
        support_service::list_chats(&state.pool, &user, pagination).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/support/chats/{id}/messages",
    params(("id" = Uuid, Path, description = "Chat ID")),
    responses(
        (status = 200, description = "Messages, oldest first", body = ApiResponse<MessageList>),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    Ok(Json(
        support_service::list_messages(&state.pool, &user, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/support/chats/{id}/messages",
    params(("id" = Uuid, Path, description = "Chat ID")),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Message posted", body = ApiResponse<SupportMessage>),
        (status = 400, description = "Blank body or closed chat"),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> AppResult<Json<ApiResponse<SupportMessage>>> {
    Ok(Json(
        support_service::post_message(&state.pool, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/support/chats/{id}/close",
    params(("id" = Uuid, Path, description = "Chat ID")),
    responses(
        (status = 200, description = "Chat closed", body = ApiResponse<SupportChat>),
        (status = 404, description = "Chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Support"
)]
pub async fn close_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SupportChat>>> {
    Ok(Json(support_service::close_chat(&state.pool, &user, id).await?))
}
