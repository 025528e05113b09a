// src/services/scoring.rs

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::{
    config::LEADERBOARD_SIZE,
    error::{AppError, is_unique_violation},
    models::score::{LeaderboardEntry, Score, ScoreHistoryEntry, ScoreReport, SubmitScoreRequest},
};

/// Counts answers whose chosen index matches the stored correct index.
fn grade(answers: &HashMap<i64, i64>, key: &HashMap<i64, i64>) -> i64 {
    answers
        .iter()
        .filter(|(question_id, chosen)| key.get(question_id) == Some(chosen))
        .count() as i64
}

/// Rejects answer sets that don't line up with the quiz: wrong count,
/// unknown question ids, or option indexes outside 0..=3.
fn check_answer_set(
    answers: &HashMap<i64, i64>,
    key: &HashMap<i64, i64>,
) -> Result<(), AppError> {
    if key.is_empty() {
        return Err(AppError::InvalidAnswerSet(
            "Quiz has no questions to answer".to_string(),
        ));
    }
    if answers.len() != key.len() {
        return Err(AppError::InvalidAnswerSet(format!(
            "Expected {} answers, got {}",
            key.len(),
            answers.len()
        )));
    }
    for (question_id, chosen) in answers {
        if !key.contains_key(question_id) {
            return Err(AppError::InvalidAnswerSet(format!(
                "Question {} does not belong to this quiz",
                question_id
            )));
        }
        if !(0..=3).contains(chosen) {
            return Err(AppError::InvalidAnswerSet(format!(
                "Option index {} is out of range",
                chosen
            )));
        }
    }
    Ok(())
}

/// Grades a submission and records it as one Score row, atomically.
///
/// The `(user_id, quiz_id)` uniqueness constraint resolves concurrent or
/// repeated submissions into `AlreadySubmitted`.
pub async fn submit_score(
    pool: &SqlitePool,
    user_id: i64,
    quiz_id: i64,
    req: SubmitScoreRequest,
) -> Result<ScoreReport, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let key: HashMap<i64, i64> =
        sqlx::query_as::<_, (i64, i64)>("SELECT id, correct_option FROM questions WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

    check_answer_set(&req.answers, &key)?;

    let total = grade(&req.answers, &key);

    let score = sqlx::query_as::<_, Score>(
        r#"
        INSERT INTO scores (quiz_id, user_id, total_scored)
        VALUES (?, ?, ?)
        RETURNING id, quiz_id, user_id, time_stamp, total_scored
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .bind(total)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::AlreadySubmitted
        } else {
            tracing::error!("Failed to insert score: {:?}", e);
            AppError::from(e)
        }
    })?;

    tx.commit().await?;

    Ok(ScoreReport {
        score,
        out_of: key.len() as i64,
    })
}

/// The caller's score history, newest first, with quiz context joined in.
pub async fn my_scores(pool: &SqlitePool, user_id: i64) -> Result<Vec<ScoreHistoryEntry>, AppError> {
    let scores = sqlx::query_as::<_, ScoreHistoryEntry>(
        r#"
        SELECT
            s.id, s.quiz_id,
            sub.name AS subject_name,
            c.name AS chapter_name,
            qz.date_of_quiz,
            s.total_scored,
            (SELECT COUNT(*) FROM questions WHERE quiz_id = s.quiz_id) AS out_of,
            s.time_stamp
        FROM scores s
        JOIN quizzes qz ON s.quiz_id = qz.id
        JOIN chapters c ON qz.chapter_id = c.id
        JOIN subjects sub ON c.subject_id = sub.id
        WHERE s.user_id = ?
        ORDER BY s.time_stamp DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(scores)
}

/// Top scores for one quiz.
pub async fn leaderboard(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT u.email, s.total_scored, s.time_stamp
        FROM scores s
        JOIN users u ON s.user_id = u.id
        WHERE s.quiz_id = ?
        ORDER BY s.total_scored DESC, s.time_stamp ASC
        LIMIT ?
        "#,
    )
    .bind(quiz_id)
    .bind(LEADERBOARD_SIZE)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(pairs: &[(i64, i64)]) -> HashMap<i64, i64> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn grade_all_correct() {
        let key = key_of(&[(1, 0), (2, 2), (3, 3)]);
        let answers = key_of(&[(1, 0), (2, 2), (3, 3)]);
        assert_eq!(grade(&answers, &key), 3);
    }

    #[test]
    fn grade_all_wrong() {
        let key = key_of(&[(1, 0), (2, 2)]);
        let answers = key_of(&[(1, 1), (2, 3)]);
        assert_eq!(grade(&answers, &key), 0);
    }

    #[test]
    fn grade_partial() {
        // Three questions, answers [correct, wrong, correct] -> 2.
        let key = key_of(&[(1, 0), (2, 1), (3, 2)]);
        let answers = key_of(&[(1, 0), (2, 3), (3, 2)]);
        assert_eq!(grade(&answers, &key), 2);
    }

    #[test]
    fn answer_count_mismatch_rejected() {
        let key = key_of(&[(1, 0), (2, 1)]);
        let answers = key_of(&[(1, 0)]);
        assert!(matches!(
            check_answer_set(&answers, &key),
            Err(AppError::InvalidAnswerSet(_))
        ));
    }

    #[test]
    fn foreign_question_rejected() {
        let key = key_of(&[(1, 0), (2, 1)]);
        let answers = key_of(&[(1, 0), (99, 1)]);
        assert!(matches!(
            check_answer_set(&answers, &key),
            Err(AppError::InvalidAnswerSet(_))
        ));
    }

    #[test]
    fn out_of_range_option_rejected() {
        let key = key_of(&[(1, 0)]);
        let answers = key_of(&[(1, 4)]);
        assert!(matches!(
            check_answer_set(&answers, &key),
            Err(AppError::InvalidAnswerSet(_))
        ));
    }

    #[test]
    fn empty_quiz_rejected() {
        let key = HashMap::new();
        let answers = HashMap::new();
        assert!(matches!(
            check_answer_set(&answers, &key),
            Err(AppError::InvalidAnswerSet(_))
        ));
    }

    #[test]
    fn matching_set_accepted() {
        let key = key_of(&[(1, 0), (2, 1)]);
        let answers = key_of(&[(1, 3), (2, 1)]);
        assert!(check_answer_set(&answers, &key).is_ok());
    }
}
