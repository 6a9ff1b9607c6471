use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit::record,
    db::like_contains,
    dto::{profile::UpdateProfileRequest, users::UserList},
    entity::users::{Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Profile,
    response::{ApiResponse, Meta},
    routes::params::UserListQuery,
    services::profile_service::update_profile_fields,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    admin: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(&state.pool, admin).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(UserCol::Email.like(like_contains(search)))
                .add(UserCol::Name.like(like_contains(search))),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(profile_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Profile>> {
    ensure_admin(&state.pool, admin).await?;
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(profile_from_entity)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", user, Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    ensure_admin(&state.pool, admin).await?;
    let profile = update_profile_fields(&state.pool, id, payload).await?;

    record(
        &state.pool,
        admin.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success("User updated", profile, Some(Meta::empty())))
}

fn profile_from_entity(model: UserModel) -> Profile {
    Profile {
        id: model.id,
        email: model.email,
        name: model.name,
        address: model.address,
        phone: model.phone,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
