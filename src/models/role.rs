// src/models/role.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'roles' table. Rows are seeded by the migrations and
/// referenced from `user_roles`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// DTO for replacing a user's role set.
#[derive(Debug, Deserialize, Validate)]
pub struct AssignRolesRequest {
    #[validate(length(min = 1, message = "At least one role is required."))]
    pub roles: Vec<String>,
}
