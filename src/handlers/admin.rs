// src/handlers/admin.rs
//
// Administrative surface: user management and content CRUD. Every
// handler names its action and asks the policy table before touching
// anything.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        chapter::{CreateChapterRequest, UpdateChapterRequest},
        question::{CreateQuestionRequest, UpdateQuestionRequest},
        quiz::{CreateQuizRequest, UpdateQuizRequest},
        role::AssignRolesRequest,
        subject::{CreateSubjectRequest, UpdateSubjectRequest},
        user::UserResponse,
    },
    services::{
        access::{Action, AuthorizationChecker, require},
        catalog, identity,
    },
    utils::jwt::Claims,
};

/// Query parameter controlling the deletion policy for subjects and
/// chapters. Defaults to block (`HasDependents`) when dependents exist.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub cascade: Option<bool>,
}

// ---------------------------------------------------------------------------
// Users

/// Lists all users with their role sets.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageUsers)?;

    let users = identity::list_users(&pool).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(users))
}

/// Deactivates a user account. Idempotent.
pub async fn deactivate_user(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageUsers)?;

    if id == claims.user_id() {
        return Err(AppError::BadRequest(
            "Cannot deactivate yourself".to_string(),
        ));
    }

    identity::deactivate(&pool, id).await?;

    Ok(StatusCode::OK)
}

/// Re-enables a deactivated user account.
pub async fn reactivate_user(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageUsers)?;

    identity::reactivate(&pool, id).await?;

    Ok(StatusCode::OK)
}

/// Lists the roles available for assignment.
pub async fn list_roles(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageUsers)?;

    let roles = identity::list_roles(&pool).await?;

    Ok(Json(roles))
}

/// Replaces a user's role set.
pub async fn assign_roles(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageUsers)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    identity::assign_roles(&pool, id, &payload.roles).await?;

    Ok(StatusCode::OK)
}

/// Deletes a user by ID. Prevents deleting self; blocked while scores
/// reference the user.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageUsers)?;

    if id == claims.user_id() {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    identity::delete_user(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Subjects

/// Creates a new subject.
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageSubjects)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let subject = catalog::create_subject(&pool, payload).await?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// Updates a subject by ID.
pub async fn update_subject(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageSubjects)?;

    catalog::update_subject(&pool, id, payload).await?;

    Ok(StatusCode::OK)
}

/// Deletes a subject, blocking or cascading per the `cascade` flag.
pub async fn delete_subject(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageSubjects)?;

    catalog::delete_subject(&pool, id, params.cascade.unwrap_or(false)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Chapters

/// Creates a new chapter under an existing subject.
pub async fn create_chapter(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageChapters)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let chapter = catalog::create_chapter(&pool, payload).await?;

    Ok((StatusCode::CREATED, Json(chapter)))
}

/// Updates a chapter by ID.
pub async fn update_chapter(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageChapters)?;

    catalog::update_chapter(&pool, id, payload).await?;

    Ok(StatusCode::OK)
}

/// Deletes a chapter, blocking or cascading per the `cascade` flag.
pub async fn delete_chapter(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageChapters)?;

    catalog::delete_chapter(&pool, id, params.cascade.unwrap_or(false)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Quizzes

/// Creates a new quiz under an existing chapter.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageQuizzes)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = catalog::create_quiz(&pool, payload).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates a quiz by ID.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageQuizzes)?;

    catalog::update_quiz(&pool, id, payload).await?;

    Ok(StatusCode::OK)
}

/// Deletes a quiz along with its questions and scores.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageQuizzes)?;

    catalog::delete_quiz(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Questions

/// Creates a new question under an existing quiz.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageQuestions)?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = catalog::create_question(&pool, payload).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question by ID.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageQuestions)?;

    catalog::update_question(&pool, id, payload).await?;

    Ok(StatusCode::OK)
}

/// Deletes a question by ID.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    State(authz): State<Arc<dyn AuthorizationChecker>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require(authz.as_ref(), &claims, Action::ManageQuestions)?;

    catalog::delete_question(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
