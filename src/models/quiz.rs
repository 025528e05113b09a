// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Represents the 'quizzes' table. A quiz belongs to exactly one chapter
/// and owns an ordered sequence of questions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub chapter_id: i64,
    pub date_of_quiz: chrono::NaiveDate,
    pub duration_minutes: i64,
    pub remarks: Option<String>,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub chapter_id: i64,
    pub date_of_quiz: chrono::NaiveDate,
    #[validate(range(min = 1, max = 600, message = "Duration must be between 1 and 600 minutes."))]
    pub duration_minutes: i64,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    pub date_of_quiz: Option<chrono::NaiveDate>,
    pub duration_minutes: Option<i64>,
    pub remarks: Option<String>,
}

/// A quiz together with its questions as served to takers, answers
/// stripped.
#[derive(Debug, Serialize)]
pub struct QuizPaper {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<PublicQuestion>,
}
