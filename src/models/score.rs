// src/models/score.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'scores' table: one recorded attempt of one user at one
/// quiz. The `(user_id, quiz_id)` pair is unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Score {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub time_stamp: Option<chrono::DateTime<chrono::Utc>>,
    pub total_scored: i64,
}

/// DTO for submitting a quiz attempt.
///
/// Key: question ID. Value: index of the chosen option (0..=3).
/// The map must cover every question of the quiz exactly once.
#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub answers: std::collections::HashMap<i64, i64>,
}

/// Response for a graded submission.
#[derive(Debug, Serialize)]
pub struct ScoreReport {
    #[serde(flatten)]
    pub score: Score,
    pub out_of: i64,
}

/// Row joined from `scores` and `users` for a quiz leaderboard.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub email: String,
    pub total_scored: i64,
    pub time_stamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row for the caller's own score history, with quiz context joined in.
#[derive(Debug, Serialize, FromRow)]
pub struct ScoreHistoryEntry {
    pub id: i64,
    pub quiz_id: i64,
    pub subject_name: String,
    pub chapter_name: String,
    pub date_of_quiz: chrono::NaiveDate,
    pub total_scored: i64,
    pub out_of: i64,
    pub time_stamp: Option<chrono::DateTime<chrono::Utc>>,
}
