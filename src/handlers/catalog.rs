// src/handlers/catalog.rs
//
// Public read-only views of the content hierarchy. Quiz papers are
// served with the correct indexes stripped.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{error::AppError, models::subject::SubjectListParams, services::catalog};

/// Lists subjects, optionally filtered by a name search keyword.
pub async fn list_subjects(
    State(pool): State<SqlitePool>,
    Query(params): Query<SubjectListParams>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = catalog::list_subjects(&pool, params.q).await?;
    Ok(Json(subjects))
}

/// Retrieves a single subject by ID.
pub async fn get_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = catalog::get_subject(&pool, id).await?;
    Ok(Json(subject))
}

/// Lists the chapters of a subject.
pub async fn list_chapters(
    State(pool): State<SqlitePool>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let chapters = catalog::list_chapters(&pool, subject_id).await?;
    Ok(Json(chapters))
}

/// Lists the quizzes of a chapter.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = catalog::list_quizzes(&pool, chapter_id).await?;
    Ok(Json(quizzes))
}

/// Serves a quiz paper: the quiz plus its questions without answers.
pub async fn get_quiz_paper(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let paper = catalog::get_quiz_paper(&pool, quiz_id).await?;
    Ok(Json(paper))
}
