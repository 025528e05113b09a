// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::config::OPTIONS_PER_QUESTION;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The question text shown to takers.
    pub statement: String,

    /// The four options, stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Index into `options` of the correct answer.
    pub correct_option: i64,
}

/// DTO for sending a question to takers (excludes the correct index).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub statement: String,
    pub options: Json<Vec<String>>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            statement: q.statement,
            options: q.options,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub quiz_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub statement: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(range(min = 0, max = 3, message = "Correct option must reference one of the four options."))]
    pub correct_option: i64,
}

/// DTO for updating a question. Fields are optional; when `options` is
/// given it is validated like on creation.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub statement: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_option: Option<i64>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("exactly_four_options_required"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("option_length_invalid"));
        }
    }
    Ok(())
}

pub(crate) fn check_options(options: &[String]) -> Result<(), crate::error::AppError> {
    validate_options(options)
        .map_err(|e| crate::error::AppError::BadRequest(e.code.to_string()))
}
