use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::users::RoleInfo,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::role_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(my_roles))
}

#[utoipa::path(
    get,
    path = "/api/role",
    responses((status = 200, description = "Roles of the caller", body = ApiResponse<RoleInfo>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn my_roles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleInfo>>> {
    Ok(Json(role_service::my_roles(&state.pool, &user).await?))
}
