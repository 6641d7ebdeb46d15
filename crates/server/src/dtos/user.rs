use chrono::NaiveDateTime;
use database::entities::users;
use models::role::Role;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// An account as returned to clients; the password hash never leaves the server
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, example = "faculty")]
    pub role: Role,
    pub department_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl From<users::Model> for AccountResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            department_id: user.department_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub department_name: Option<String>,
}

impl UserResponse {
    pub fn new(user: users::Model, department_name: Option<String>) -> Self {
        Self {
            account: user.into(),
            department_name,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UsersQuery {
    /// Only accounts with this role
    #[param(value_type = Option<String>, example = "hod")]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[schema(value_type = String, example = "hod")]
    pub role: Role,
    pub department_id: Option<i32>,
}

/// Replaces every field; the password only when given
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    #[schema(value_type = String, example = "hod")]
    pub role: Role,
    pub department_id: Option<i32>,
}
