use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Profile;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<Profile>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleInfo {
    pub roles: Vec<String>,
    pub is_admin: bool,
}
