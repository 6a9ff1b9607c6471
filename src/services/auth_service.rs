use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::record,
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::USER_ROLE,
    models::Profile,
    response::{ApiResponse, Meta},
    services::{profile_service::fetch_profile, role_service::grant_role_unchecked},
    state::{AppState, JwtSettings},
};
use crate::dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest};

pub const MIN_PASSWORD_LEN: usize = 6;
const EMAIL_TAKEN: &str = "Email is already taken";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }
    Ok(email)
}

pub fn issue_token(
    jwt: &JwtSettings,
    user_id: Uuid,
    email: &str,
) -> AppResult<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(jwt.ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expiration))
}

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Profile>> {
    let RegisterRequest {
        email,
        password,
        name,
    } = payload;
    let email = normalize_email(&email)?;
    validate_password(&password)?;

    let password_hash = hash_password(&password)?;
    let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let now = Utc::now();

    // the UNIQUE index on email decides races between concurrent sign-ups
    let mut tx = pool.begin().await?;
    let user: Profile = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING id, email, name, address, phone, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(name)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| AppError::unique_violation(err, EMAIL_TAKEN))?;

    grant_role_unchecked(&mut *tx, user.id, USER_ROLE).await?;
    tx.commit().await?;

    record(
        pool,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();

    let row: Option<(Uuid, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&state.pool)
            .await?;

    let invalid = || AppError::Unauthorized("Invalid email or password".into());
    let (user_id, password_hash) = row.ok_or_else(invalid)?;

    if !verify_password(&password, &password_hash)? {
        return Err(invalid());
    }

    let (token, expires_at) = issue_token(&state.jwt, user_id, &email)?;
    let user = fetch_profile(&state.pool, user_id).await?;

    record(
        &state.pool,
        user_id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    let resp = LoginResponse {
        token,
        token_type: "Bearer".into(),
        expires_at,
        user,
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}
