use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Permission, UserPermission};
use crate::db::types::{OverrideType, UserRole};

#[derive(Debug, Serialize)]
pub(crate) struct PermissionResponse {
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) category: String,
}

impl PermissionResponse {
    pub(crate) fn from_db(permission: Permission) -> Self {
        Self { code: permission.code, name: permission.name, category: permission.category }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleGrantsResponse {
    pub(crate) role: UserRole,
    pub(crate) codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleGrantsUpdate {
    pub(crate) codes: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OverrideCreate {
    #[serde(alias = "permissionCode")]
    #[validate(length(min = 1, message = "permission_code must not be empty"))]
    pub(crate) permission_code: String,
    #[serde(alias = "overrideType")]
    pub(crate) override_type: OverrideType,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OverrideResponse {
    pub(crate) user_id: String,
    pub(crate) permission_code: String,
    pub(crate) override_type: OverrideType,
    pub(crate) reason: Option<String>,
    pub(crate) granted_by: String,
    pub(crate) created_at: String,
}

impl OverrideResponse {
    pub(crate) fn from_db(row: UserPermission) -> Self {
        Self {
            user_id: row.user_id,
            permission_code: row.permission_code,
            override_type: row.override_type,
            reason: row.reason,
            granted_by: row.granted_by,
            created_at: format_primitive(row.created_at),
        }
    }
}
