// src/handlers/scores.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::score::SubmitScoreRequest,
    services::{
        access::{Action, AuthorizationChecker, require},
        scoring,
    },
    utils::jwt::Claims,
};

/// Submits a user's answers for a quiz and returns the recorded score.
///
/// One attempt per (user, quiz): a repeated submission is rejected with
/// 409 by the uniqueness constraint on the scores table.
pub async fn submit(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::AttemptQuiz)?;

    let report = scoring::submit_score(&pool, claims.user_id(), quiz_id, req).await?;

    Ok(Json(report))
}

/// Lists the current user's score history.
pub async fn my_scores(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ViewOwnScores)?;

    let scores = scoring::my_scores(&pool, claims.user_id()).await?;

    Ok(Json(scores))
}

/// Retrieves the top scores for a quiz.
pub async fn leaderboard(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let entries = scoring::leaderboard(&pool, quiz_id).await?;

    Ok(Json(entries))
}
