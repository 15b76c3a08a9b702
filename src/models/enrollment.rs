// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::grading::AnswerDetail;

/// Represents the 'enrollments' table in the database: the progress
/// record for one (user, course) pair.
///
/// `score`, `quizzes_taken` and `average_score` are maintained in the
/// same atomic UPDATE that accepts a quiz submission, so
/// `average_score == score / quizzes_taken` (0 when nothing taken)
/// holds after every mutation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub score: i64,
    pub quizzes_taken: i64,
    pub average_score: f64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Quiz-taking statistics nested under `stats` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub quizzes_taken: i64,
    pub average_score: f64,
}

/// The `progress` object returned by every mutating endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub course_id: i64,
    pub completed_modules: Vec<i64>,
    pub score: i64,
    pub stats: ProgressStats,
}

/// One graded submission in the enrollment's quiz-review history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedQuiz {
    pub quiz: i64,
    pub score: i64,
    pub details: Vec<AnswerDetail>,
}

/// Row shape for reading 'quiz_submissions'.
#[derive(Debug, FromRow)]
pub struct SubmissionRow {
    pub quiz_id: i64,
    pub score: i64,
    pub details: Json<Vec<AnswerDetail>>,
}

impl From<SubmissionRow> for SubmittedQuiz {
    fn from(row: SubmissionRow) -> Self {
        SubmittedQuiz {
            quiz: row.quiz_id,
            score: row.score,
            details: row.details.0,
        }
    }
}

/// DTO for marking a module as completed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteModuleRequest {
    pub course_id: Option<i64>,
}

/// DTO for submitting quiz answers.
/// Keys of `answers` are question ids.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub course_id: Option<i64>,
    pub answers: Option<std::collections::HashMap<i64, String>>,
}

/// DTO for the administrative bulk-correction endpoint.
///
/// `completed_modules` replaces the set wholesale; `score` and
/// `quizzes_taken` are deltas added to the running totals.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub completed_modules: Option<Vec<i64>>,
    #[validate(range(min = 0))]
    pub score: Option<i64>,
    #[validate(range(min = 0))]
    pub quizzes_taken: Option<i64>,
}
