// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Deactivated accounts keep their rows (scores reference them) but
    /// can no longer authenticate.
    pub active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row for the admin user listing, with the role set aggregated into a
/// comma-separated string by the query.
#[derive(Debug, FromRow)]
pub struct UserWithRoles {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub roles: Option<String>,
}

/// Admin-facing user summary.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub roles: Vec<String>,
}

impl From<UserWithRoles> for UserResponse {
    fn from(row: UserWithRoles) -> Self {
        let roles = row
            .roles
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            id: row.id,
            email: row.email,
            active: row.active,
            created_at: row.created_at,
            roles,
        }
    }
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub active: bool,
    pub roles: Vec<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub attempts_count: i64,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(max = 128, message = "Password length must be at most 128 characters."))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
