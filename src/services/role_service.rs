use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::record,
    db::{self, DbPool},
    dto::users::{GrantRoleRequest, RoleInfo},
    error::{AppError, AppResult},
    middleware::auth::{ADMIN_ROLE, AuthUser, USER_ROLE, ensure_admin},
    response::{ApiResponse, Meta},
};

const KNOWN_ROLES: [&str; 2] = [ADMIN_ROLE, USER_ROLE];

pub async fn list_roles(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<String>> {
    let rows: Vec<(String,)> = db::all(
        pool,
        sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
            .bind(user_id),
    )
    .await?;
    Ok(rows.into_iter().map(|(role,)| role).collect())
}

pub async fn my_roles(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<RoleInfo>> {
    let roles = list_roles(pool, user.user_id).await?;
    let is_admin = roles.iter().any(|r| r == ADMIN_ROLE);
    Ok(ApiResponse::success(
        "OK",
        RoleInfo { roles, is_admin },
        Some(Meta::empty()),
    ))
}

pub async fn user_roles(
    pool: &DbPool,
    admin: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<RoleInfo>> {
    ensure_admin(pool, admin).await?;
    ensure_user_exists(pool, user_id).await?;
    let roles = list_roles(pool, user_id).await?;
    let is_admin = roles.iter().any(|r| r == ADMIN_ROLE);
    Ok(ApiResponse::success(
        "OK",
        RoleInfo { roles, is_admin },
        Some(Meta::empty()),
    ))
}

/// Insert a role row without any permission check. Idempotent.
/// Inserts the role row without any permission check. Takes any executor so
/// registration can grant inside its own transaction.
pub async fn grant_role_unchecked<'e, E>(executor: E, user_id: Uuid, role: &str) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO user_roles (user_id, role, created_at) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(user_id)
    .bind(role)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn grant_role(
    pool: &DbPool,
    admin: &AuthUser,
    user_id: Uuid,
    payload: GrantRoleRequest,
) -> AppResult<ApiResponse<RoleInfo>> {
    ensure_admin(pool, admin).await?;
    let role = validate_role(&payload.role)?;
    ensure_user_exists(pool, user_id).await?;

    grant_role_unchecked(pool, user_id, role).await?;

    record(
        pool,
        admin.user_id,
        "role_grant",
        "user_roles",
        serde_json::json!({ "user_id": user_id, "role": role }),
    )
    .await;

    let roles = list_roles(pool, user_id).await?;
    let is_admin = roles.iter().any(|r| r == ADMIN_ROLE);
    Ok(ApiResponse::success(
        "Role granted",
        RoleInfo { roles, is_admin },
        Some(Meta::empty()),
    ))
}

pub async fn revoke_role(
    pool: &DbPool,
    admin: &AuthUser,
    user_id: Uuid,
    role: &str,
) -> AppResult<ApiResponse<RoleInfo>> {
    ensure_admin(pool, admin).await?;
    let role = validate_role(role)?;
    if role == ADMIN_ROLE && user_id == admin.user_id {
        return Err(AppError::BadRequest(
            "cannot revoke your own admin role".into(),
        ));
    }

    let affected = db::run(
        pool,
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role),
    )
    .await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    record(
        pool,
        admin.user_id,
        "role_revoke",
        "user_roles",
        serde_json::json!({ "user_id": user_id, "role": role }),
    )
    .await;

    let roles = list_roles(pool, user_id).await?;
    let is_admin = roles.iter().any(|r| r == ADMIN_ROLE);
    Ok(ApiResponse::success(
        "Role revoked",
        RoleInfo { roles, is_admin },
        Some(Meta::empty()),
    ))
}

fn validate_role(role: &str) -> AppResult<&'static str> {
    let role = role.trim();
    KNOWN_ROLES
        .iter()
        .copied()
        .find(|known| *known == role)
        .ok_or_else(|| AppError::BadRequest(format!("unknown role '{role}'")))
}

async fn ensure_user_exists(pool: &DbPool, user_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> =
        db::get(pool, sqlx::query_as("SELECT id FROM users WHERE id = $1").bind(user_id)).await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(())
}
