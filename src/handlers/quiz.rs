// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    grading,
    models::{enrollment::SubmitQuizRequest, quiz::Question},
    utils::jwt::{Claims, user_id},
};

use super::progress::{fetch_enrollment, progress_view};

/// Grades and records a quiz submission for the current user.
///
/// POST /api/quizzes/{quiz_id}/submit
///
/// * A quiz can be submitted at most once per enrollment. The duplicate
///   is detected before grading runs, and the unique index behind the
///   `ON CONFLICT DO NOTHING` insert catches the race where two
///   identical requests arrive together.
/// * The submission insert and the score/stats update share one
///   transaction, so a failed write leaves the record unchanged and the
///   whole operation is safe to retry (grading is pure).
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user_id(&claims)?;

    let course_id = payload
        .course_id
        .ok_or(AppError::BadRequest("courseId is required".to_string()))?;
    let answers = payload
        .answers
        .ok_or(AppError::BadRequest("answers are required".to_string()))?;

    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;

    // Reject resubmission before grading; no further work is done.
    let already_submitted: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM quiz_submissions WHERE enrollment_id = ?1 AND quiz_id = ?2",
    )
    .bind(enrollment.id)
    .bind(quiz_id)
    .fetch_optional(&pool)
    .await?;

    if already_submitted.is_some() {
        return Err(AppError::Conflict("Quiz already submitted".to_string()));
    }

    let _quiz: i64 = sqlx::query_scalar("SELECT id FROM quizzes WHERE id = ?1")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_type, content, options, answer, position
        FROM questions
        WHERE quiz_id = ?1
        ORDER BY position
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    let result = grading::grade(&questions, &answers);
    let details = serde_json::to_string(&result.correct_answers)?;

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO quiz_submissions (enrollment_id, quiz_id, score, details)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (enrollment_id, quiz_id) DO NOTHING
        "#,
    )
    .bind(enrollment.id)
    .bind(quiz_id)
    .bind(result.score)
    .bind(details)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        // Lost the race against a concurrent identical submission.
        return Err(AppError::Conflict("Quiz already submitted".to_string()));
    }

    sqlx::query(
        r#"
        UPDATE enrollments
        SET score = score + ?1,
            quizzes_taken = quizzes_taken + 1,
            average_score = CAST(score + ?1 AS REAL) / (quizzes_taken + 1)
        WHERE id = ?2
        "#,
    )
    .bind(result.score)
    .bind(enrollment.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;
    let progress = progress_view(&pool, &enrollment).await?;

    Ok(Json(json!({
        "message": "Quiz submitted successfully",
        "result": result,
        "progress": progress,
        "submittedQuizId": quiz_id,
    })))
}
