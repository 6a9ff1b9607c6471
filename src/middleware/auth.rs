use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::auth::Claims,
    error::{AppError, AppResult},
    state::{AppState, JwtSettings},
};

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

pub async fn has_role(pool: &DbPool, user_id: Uuid, role: &str) -> AppResult<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub async fn ensure_role(pool: &DbPool, user: &AuthUser, role: &str) -> AppResult<()> {
    if !has_role(pool, user.user_id, role).await? {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn ensure_admin(pool: &DbPool, user: &AuthUser) -> AppResult<()> {
    ensure_role(pool, user, ADMIN_ROLE).await
}

pub fn decode_token(jwt: &JwtSettings, token: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;
    Ok(decoded.claims)
}

fn bearer_token(parts: &Parts) -> AppResult<&str> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.jwt, token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        // tokens outlive deleted accounts
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::Unauthorized("User no longer exists".into()));
        }

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}
