use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::record,
    db::{self, DbPool},
    dto::support::{ChatList, MessageList, PostMessageRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, has_role, ADMIN_ROLE},
    models::{SupportChat, SupportMessage},
    response::{ApiResponse, Meta},
    routes::params::{ChatListQuery, Pagination},
};

pub const CHAT_OPEN: &str = "open";
pub const CHAT_CLOSED: &str = "closed";
pub const SENDER_USER: &str = "user";
pub const SENDER_SUPPORT: &str = "support";

const CHAT_COLUMNS: &str = "id, user_id, status, created_at, updated_at, closed_at";

/// Returns the caller's open chat, creating one when none exists.
pub async fn open_chat(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<SupportChat>> {
    if let Some(chat) = find_open_chat(pool, user.user_id).await? {
        return Ok(ApiResponse::success("Chat", chat, Some(Meta::empty())));
    }

    let now = Utc::now();
    let chat = sqlx::query_as::<_, SupportChat>(&format!(
        r#"
        INSERT INTO support_chats (id, user_id, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING {CHAT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(CHAT_OPEN)
    .bind(now)
    .fetch_one(pool)
    .await?;

    record(
        pool,
        user.user_id,
        "support_chat_open",
        "support_chats",
        serde_json::json!({ "chat_id": chat.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Chat opened",
        chat,
        Some(Meta::empty()),
    ))
}

pub async fn list_chats(
    pool: &DbPool,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ChatList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = db::all(
        pool,
        sqlx::query_as::<_, SupportChat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM support_chats
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user.user_id)
        .bind(limit)
        .bind(offset),
    )
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM support_chats WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", ChatList { items }, Some(meta)))
}

pub async fn list_messages(
    pool: &DbPool,
    user: &AuthUser,
    chat_id: Uuid,
) -> AppResult<ApiResponse<MessageList>> {
    let chat = load_chat(pool, chat_id).await?;
    if chat.user_id != user.user_id && !has_role(pool, user.user_id, ADMIN_ROLE).await? {
        return Err(AppError::NotFound);
    }

    let items = db::all(
        pool,
        sqlx::query_as::<_, SupportMessage>(
            r#"
            SELECT id, chat_id, sender, body, created_at
            FROM support_messages
            WHERE chat_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(chat_id),
    )
    .await?;

    let meta = Meta::single_page(items.len());
    Ok(ApiResponse::success(
        "OK",
        MessageList { chat, items },
        Some(meta),
    ))
}

pub async fn post_message(
    pool: &DbPool,
    user: &AuthUser,
    chat_id: Uuid,
    payload: PostMessageRequest,
) -> AppResult<ApiResponse<SupportMessage>> {
    let chat = load_chat(pool, chat_id).await?;
    if chat.user_id != user.user_id {
        return Err(AppError::NotFound);
    }
    let message = insert_message(pool, &chat, SENDER_USER, &payload.body).await?;
    Ok(ApiResponse::success(
        "Message sent",
        message,
        Some(Meta::empty()),
    ))
}

pub async fn close_chat(
    pool: &DbPool,
    user: &AuthUser,
    chat_id: Uuid,
) -> AppResult<ApiResponse<SupportChat>> {
    let chat = load_chat(pool, chat_id).await?;
    if chat.user_id != user.user_id {
        return Err(AppError::NotFound);
    }
    if chat.status == CHAT_CLOSED {
        return Ok(ApiResponse::success("Chat", chat, Some(Meta::empty())));
    }

    let now = Utc::now();
    let chat = sqlx::query_as::<_, SupportChat>(&format!(
        r#"
        UPDATE support_chats
        SET status = $2, closed_at = $3, updated_at = $3
        WHERE id = $1
        RETURNING {CHAT_COLUMNS}
        "#
    ))
    .bind(chat_id)
    .bind(CHAT_CLOSED)
    .bind(now)
    .fetch_one(pool)
    .await?;

    record(
        pool,
        user.user_id,
        "support_chat_close",
        "support_chats",
        serde_json::json!({ "chat_id": chat.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Chat closed",
        chat,
        Some(Meta::empty()),
    ))
}

/// Support inbox across all users, most recently active first.
pub async fn admin_list_chats(
    pool: &DbPool,
    user: &AuthUser,
    query: ChatListQuery,
) -> AppResult<ApiResponse<ChatList>> {
    ensure_admin(pool, user).await?;
    let (page, limit, offset) = query.pagination().normalize();
    let status = query.status.filter(|s| !s.trim().is_empty());

    let items = db::all(
        pool,
        sqlx::query_as::<_, SupportChat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM support_chats
            WHERE ($1 IS NULL OR status = $1)
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.as_deref())
        .bind(limit)
        .bind(offset),
    )
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM support_chats WHERE ($1 IS NULL OR status = $1)")
            .bind(status.as_deref())
            .fetch_one(pool)
            .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Support inbox", ChatList { items }, Some(meta)))
}

pub async fn admin_reply(
    pool: &DbPool,
    user: &AuthUser,
    chat_id: Uuid,
    payload: PostMessageRequest,
) -> AppResult<ApiResponse<SupportMessage>> {
    ensure_admin(pool, user).await?;
    let chat = load_chat(pool, chat_id).await?;
    let message = insert_message(pool, &chat, SENDER_SUPPORT, &payload.body).await?;

    record(
        pool,
        user.user_id,
        "support_reply",
        "support_messages",
        serde_json::json!({ "chat_id": chat.id, "message_id": message.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reply sent",
        message,
        Some(Meta::empty()),
    ))
}

async fn find_open_chat(pool: &DbPool, user_id: Uuid) -> AppResult<Option<SupportChat>> {
    let chat = db::get(
        pool,
        sqlx::query_as::<_, SupportChat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM support_chats
            WHERE user_id = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(CHAT_OPEN),
    )
    .await?;
    Ok(chat)
}

async fn load_chat(pool: &DbPool, chat_id: Uuid) -> AppResult<SupportChat> {
    db::get(
        pool,
        sqlx::query_as::<_, SupportChat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM support_chats WHERE id = $1"
        ))
        .bind(chat_id),
    )
    .await?
    .ok_or(AppError::NotFound)
}

async fn insert_message(
    pool: &DbPool,
    chat: &SupportChat,
    sender: &str,
    body: &str,
) -> AppResult<SupportMessage> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::BadRequest("message body is required".into()));
    }
    if chat.status == CHAT_CLOSED {
        return Err(AppError::BadRequest("chat is closed".into()));
    }

    let now = Utc::now();
    let message = sqlx::query_as::<_, SupportMessage>(
        r#"
        INSERT INTO support_messages (id, chat_id, sender, body, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, chat_id, sender, body, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(chat.id)
    .bind(sender)
    .bind(body)
    .bind(now)
    .fetch_one(pool)
    .await?;

    db::run(
        pool,
        sqlx::query("UPDATE support_chats SET updated_at = $2 WHERE id = $1")
            .bind(chat.id)
            .bind(now),
    )
    .await?;

    Ok(message)
}
