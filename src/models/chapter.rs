// src/models/chapter.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'chapters' table. A chapter belongs to exactly one
/// subject and owns zero or more quizzes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub description: String,
}

/// DTO for creating a chapter.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChapterRequest {
    pub subject_id: i64,
    #[validate(length(min = 1, max = 100, message = "Name length must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
}

/// DTO for updating a chapter. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}
