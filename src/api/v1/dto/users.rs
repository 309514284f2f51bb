/*
 * Responsibility
 * - Request / response DTOs for the admin /users routes
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::repos::account::{Account, Role};

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<String>,
}

/// Body of PUT /users/{id}. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    // Only inspected to refuse password changes through this route
    #[serde(default)]
    pub password: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleChanged {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for RoleChanged {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
            role: a.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}

impl From<&Account> for StatusChanged {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
            is_active: a.is_active,
        }
    }
}
