// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
}

/// Represents the 'questions' table in the database.
/// The grader treats a quiz's question list as an immutable snapshot:
/// later edits never regrade past submissions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// Question type: 'mcq' (multiple choice) or 'short' (free text).
    pub question_type: String,

    /// The text content of the question.
    pub content: String,

    /// List of options for 'mcq' questions, empty for 'short'.
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The correct answer string.
    pub answer: String,

    pub position: i64,
}

/// DTO for sending a question to quiz takers (excludes the answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub question_type: String,
    pub content: String,
    pub options: Json<Vec<String>>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            content: q.content,
            options: q.options,
        }
    }
}

/// DTO for creating a quiz together with its question list.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for one question inside a quiz-creation request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(custom(function = validate_question_type))]
    pub question_type: String,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

fn validate_question_type(question_type: &str) -> Result<(), validator::ValidationError> {
    match question_type {
        "mcq" | "short" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_question_type")),
    }
}

fn validate_options(options: &Vec<String>) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_length"));
        }
    }
    Ok(())
}
