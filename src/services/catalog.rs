// src/services/catalog.rs
//
// CRUD and consistency for the content hierarchy:
// Subject -> Chapter -> Quiz -> Question. Every mutating operation runs
// inside one transaction; parent existence is validated in the same
// transaction as the write.

use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::{
        chapter::{Chapter, CreateChapterRequest, UpdateChapterRequest},
        question::{
            CreateQuestionRequest, PublicQuestion, Question, UpdateQuestionRequest, check_options,
        },
        quiz::{CreateQuizRequest, Quiz, QuizPaper, UpdateQuizRequest},
        subject::{CreateSubjectRequest, Subject, UpdateSubjectRequest},
    },
};

const SUBJECT_COLS: &str = "id, name, description";
const CHAPTER_COLS: &str = "id, subject_id, name, description";
const QUIZ_COLS: &str = "id, chapter_id, date_of_quiz, duration_minutes, remarks";
const QUESTION_COLS: &str = "id, quiz_id, statement, options, correct_option";

// ---------------------------------------------------------------------------
// Subjects

pub async fn list_subjects(pool: &SqlitePool, q: Option<String>) -> Result<Vec<Subject>, AppError> {
    let search_pattern = q.map(|k| format!("%{}%", k));

    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, name, description
        FROM subjects
        WHERE (? IS NULL OR name LIKE ?)
        ORDER BY name
        "#,
    )
    .bind(search_pattern.clone())
    .bind(search_pattern)
    .fetch_all(pool)
    .await?;

    Ok(subjects)
}

pub async fn get_subject(pool: &SqlitePool, id: i64) -> Result<Subject, AppError> {
    sqlx::query_as::<_, Subject>("SELECT id, name, description FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))
}

pub async fn create_subject(
    pool: &SqlitePool,
    payload: CreateSubjectRequest,
) -> Result<Subject, AppError> {
    let subject = sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (name, description) VALUES (?, ?) RETURNING {SUBJECT_COLS}"
    ))
    .bind(payload.name)
    .bind(payload.description)
    .fetch_one(pool)
    .await?;

    Ok(subject)
}

pub async fn update_subject(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateSubjectRequest,
) -> Result<(), AppError> {
    if payload.name.is_none() && payload.description.is_none() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE subjects SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await.map_err(|e| {
        tracing::error!("Failed to update subject: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(())
}

/// Deletes a subject. With `cascade = false` the call fails with
/// `HasDependents` while chapters exist and nothing changes; with
/// `cascade = true` every descendant chapter, quiz, question and score
/// goes with it, atomically.
pub async fn delete_subject(pool: &SqlitePool, id: i64, cascade: bool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let chapter_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chapters WHERE subject_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

    if chapter_count > 0 && !cascade {
        return Err(AppError::HasDependents(format!(
            "Subject has {} chapter(s); pass cascade=true to delete them too",
            chapter_count
        )));
    }

    sqlx::query(
        r#"
        DELETE FROM scores WHERE quiz_id IN (
            SELECT q.id FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            WHERE c.subject_id = ?
        )
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM questions WHERE quiz_id IN (
            SELECT q.id FROM quizzes q
            JOIN chapters c ON q.chapter_id = c.id
            WHERE c.subject_id = ?
        )
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM quizzes WHERE chapter_id IN (SELECT id FROM chapters WHERE subject_id = ?)")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM chapters WHERE subject_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Chapters

pub async fn list_chapters(pool: &SqlitePool, subject_id: i64) -> Result<Vec<Chapter>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(subject_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let chapters = sqlx::query_as::<_, Chapter>(
        "SELECT id, subject_id, name, description FROM chapters WHERE subject_id = ? ORDER BY name",
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    Ok(chapters)
}

pub async fn create_chapter(
    pool: &SqlitePool,
    payload: CreateChapterRequest,
) -> Result<Chapter, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(payload.subject_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let chapter = sqlx::query_as::<_, Chapter>(&format!(
        "INSERT INTO chapters (subject_id, name, description) VALUES (?, ?, ?) RETURNING {CHAPTER_COLS}"
    ))
    .bind(payload.subject_id)
    .bind(payload.name)
    .bind(payload.description)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(chapter)
}

pub async fn update_chapter(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateChapterRequest,
) -> Result<(), AppError> {
    if payload.name.is_none() && payload.description.is_none() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE chapters SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }

    Ok(())
}

/// Deletes a chapter, mirroring the subject policy one level down.
pub async fn delete_chapter(pool: &SqlitePool, id: i64, cascade: bool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM chapters WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    let quiz_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quizzes WHERE chapter_id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

    if quiz_count > 0 && !cascade {
        return Err(AppError::HasDependents(format!(
            "Chapter has {} quiz(zes); pass cascade=true to delete them too",
            quiz_count
        )));
    }

    sqlx::query("DELETE FROM scores WHERE quiz_id IN (SELECT id FROM quizzes WHERE chapter_id = ?)")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM questions WHERE quiz_id IN (SELECT id FROM quizzes WHERE chapter_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM quizzes WHERE chapter_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM chapters WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Quizzes

pub async fn list_quizzes(pool: &SqlitePool, chapter_id: i64) -> Result<Vec<Quiz>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM chapters WHERE id = ?")
        .bind(chapter_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    let quizzes = sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {QUIZ_COLS} FROM quizzes WHERE chapter_id = ? ORDER BY date_of_quiz"
    ))
    .bind(chapter_id)
    .fetch_all(pool)
    .await?;

    Ok(quizzes)
}

pub async fn create_quiz(pool: &SqlitePool, payload: CreateQuizRequest) -> Result<Quiz, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM chapters WHERE id = ?")
        .bind(payload.chapter_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        r#"
        INSERT INTO quizzes (chapter_id, date_of_quiz, duration_minutes, remarks)
        VALUES (?, ?, ?, ?)
        RETURNING {QUIZ_COLS}
        "#
    ))
    .bind(payload.chapter_id)
    .bind(payload.date_of_quiz)
    .bind(payload.duration_minutes)
    .bind(payload.remarks)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(quiz)
}

pub async fn update_quiz(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateQuizRequest,
) -> Result<(), AppError> {
    if payload.date_of_quiz.is_none()
        && payload.duration_minutes.is_none()
        && payload.remarks.is_none()
    {
        return Ok(());
    }

    if let Some(duration) = payload.duration_minutes {
        if duration <= 0 {
            return Err(AppError::BadRequest(
                "Duration must be positive".to_string(),
            ));
        }
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(date_of_quiz) = payload.date_of_quiz {
        separated.push("date_of_quiz = ");
        separated.push_bind_unseparated(date_of_quiz);
    }

    if let Some(duration_minutes) = payload.duration_minutes {
        separated.push("duration_minutes = ");
        separated.push_bind_unseparated(duration_minutes);
    }

    if let Some(remarks) = payload.remarks {
        separated.push("remarks = ");
        separated.push_bind_unseparated(remarks);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(())
}

/// Deletes a quiz along with its questions and scores.
pub async fn delete_quiz(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    sqlx::query("DELETE FROM scores WHERE quiz_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Fetches a quiz with its questions as served to takers, answers
/// stripped.
pub async fn get_quiz_paper(pool: &SqlitePool, quiz_id: i64) -> Result<QuizPaper, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLS} FROM quizzes WHERE id = ?"))
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLS} FROM questions WHERE quiz_id = ? ORDER BY id"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(QuizPaper {
        quiz,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
    })
}

// ---------------------------------------------------------------------------
// Questions

pub async fn create_question(
    pool: &SqlitePool,
    payload: CreateQuestionRequest,
) -> Result<Question, AppError> {
    check_options(&payload.options)?;
    if !(0..payload.options.len() as i64).contains(&payload.correct_option) {
        return Err(AppError::BadRequest(
            "Correct option index must reference an existing option".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(payload.quiz_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions (quiz_id, statement, options, correct_option)
        VALUES (?, ?, ?, ?)
        RETURNING {QUESTION_COLS}
        "#
    ))
    .bind(payload.quiz_id)
    .bind(payload.statement)
    .bind(Json(payload.options))
    .bind(payload.correct_option)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(question)
}

pub async fn update_question(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateQuestionRequest,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLS} FROM questions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let statement = payload.statement.unwrap_or(current.statement);
    let options = payload.options.unwrap_or(current.options.0);
    let correct_option = payload.correct_option.unwrap_or(current.correct_option);

    check_options(&options)?;
    if !(0..options.len() as i64).contains(&correct_option) {
        return Err(AppError::BadRequest(
            "Correct option index must reference an existing option".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE questions SET statement = ?, options = ?, correct_option = ? WHERE id = ?",
    )
    .bind(statement)
    .bind(Json(options))
    .bind(correct_option)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}

/// Deletes a question. Refused once the quiz has recorded scores, since
/// shrinking the question count would invalidate score totals.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let quiz_id = sqlx::query_scalar::<_, i64>("SELECT quiz_id FROM questions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let score_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scores WHERE quiz_id = ?")
        .bind(quiz_id)
        .fetch_one(&mut *tx)
        .await?;

    if score_count > 0 {
        return Err(AppError::HasDependents(
            "Quiz already has recorded scores; its questions cannot be removed".to_string(),
        ));
    }

    sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}
