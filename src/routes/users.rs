use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::{
        profile::UpdateProfileRequest,
        users::{GrantRoleRequest, RoleInfo, UserList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Profile,
    response::ApiResponse,
    routes::params::UserListQuery,
    services::{role_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user))
        .route("/{id}/roles", get(user_roles).post(grant_role))
        .route("/{id}/roles/{role}", delete(revoke_role))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "User profiles", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(user_service::list_users(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<Profile>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    Ok(Json(user_service::get_user(&state, &user, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<Profile>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    Ok(Json(
        user_service::update_user(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/roles",
    params(("id" = Uuid, Path, description = "User ID")),
    responses((status = 200, description = "Roles of the user", body = ApiResponse<RoleInfo>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn user_roles(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RoleInfo>>> {
    Ok(Json(role_service::user_roles(&state.pool, &user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/roles",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = GrantRoleRequest,
    responses(
        (status = 200, description = "Role granted", body = ApiResponse<RoleInfo>),
        (status = 400, description = "Unknown role")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn grant_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<GrantRoleRequest>,
) -> AppResult<Json<ApiResponse<RoleInfo>>> {
    Ok(Json(
        role_service::grant_role(&state.pool, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/roles/{role}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("role" = String, Path, description = "Role name")
    ),
    responses(
        (status = 200, description = "Role revoked", body = ApiResponse<RoleInfo>),
        (status = 400, description = "Cannot revoke own admin role"),
        (status = 404, description = "Role not held")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn revoke_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, role)): Path<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<RoleInfo>>> {
    Ok(Json(
        role_service::revoke_role(&state.pool, &user, id, &role).await?,
    ))
}
