use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::record,
    db::{self, DbPool},
    dto::profile::{ChangePasswordRequest, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    services::auth_service::{hash_password, validate_password, verify_password},
};

pub(crate) const PROFILE_COLUMNS: &str =
    "id, email, name, address, phone, created_at, updated_at";

pub async fn fetch_profile(pool: &DbPool, user_id: Uuid) -> AppResult<Profile> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");
    db::get(pool, sqlx::query_as::<_, Profile>(&sql).bind(user_id))
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = fetch_profile(pool, user.user_id).await?;
    Ok(ApiResponse::success("Profile", profile, Some(Meta::empty())))
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let profile = update_profile_fields(pool, user.user_id, payload).await?;

    record(
        pool,
        user.user_id,
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success("Profile updated", profile, Some(Meta::empty())))
}

/// Apply a partial update. An empty string clears the field.
pub(crate) async fn update_profile_fields(
    pool: &DbPool,
    user_id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<Profile> {
    let existing = fetch_profile(pool, user_id).await?;

    let name = merge_field(payload.name, existing.name);
    let address = merge_field(payload.address, existing.address);
    let phone = merge_field(payload.phone, existing.phone);

    let sql = format!(
        r#"
        UPDATE users
        SET name = $2, address = $3, phone = $4, updated_at = $5
        WHERE id = $1
        RETURNING {PROFILE_COLUMNS}
        "#
    );
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .bind(name)
        .bind(address)
        .bind(phone)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(profile)
}

pub async fn change_password(
    pool: &DbPool,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    validate_password(&payload.new_password)?;

    let current: Option<(String,)> = db::get(
        pool,
        sqlx::query_as("SELECT password_hash FROM users WHERE id = $1").bind(user.user_id),
    )
    .await?;
    let (current_hash,) = current.ok_or(AppError::NotFound)?;

    if !verify_password(&payload.current_password, &current_hash)? {
        return Err(AppError::BadRequest("current password is incorrect".into()));
    }

    let new_hash = hash_password(&payload.new_password)?;
    db::run(
        pool,
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(user.user_id)
            .bind(new_hash)
            .bind(Utc::now()),
    )
    .await?;

    record(
        pool,
        user.user_id,
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password changed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn merge_field(update: Option<String>, existing: Option<String>) -> Option<String> {
    match update {
        Some(value) => {
            let value = value.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        None => existing,
    }
}
