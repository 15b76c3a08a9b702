// src/handlers/progress.rs
//
// Enrollment ledger endpoints: enroll, read/update progress, complete
// modules, and the quiz-review projection. Duplicate completions are
// rejected with an atomic insert-if-absent write rather than a
// check-then-act pair, so two racing requests cannot both succeed.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::Course,
        enrollment::{
            CompleteModuleRequest, Enrollment, ProgressStats, ProgressView, SubmissionRow,
            SubmittedQuiz, UpdateProgressRequest,
        },
    },
    progress::completion_percent,
    utils::jwt::{Claims, user_id},
};

/// Loads the enrollment record for (user, course), or rejects with the
/// "not enrolled" reason.
pub(crate) async fn fetch_enrollment(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<Enrollment, AppError> {
    sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, user_id, course_id, score, quizzes_taken, average_score, created_at
        FROM enrollments
        WHERE user_id = ?1 AND course_id = ?2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound(
        "You are not enrolled in this course".to_string(),
    ))
}

/// Builds the `progress` object returned by the mutating endpoints.
/// Completed modules are listed in the catalog's display order.
pub(crate) async fn progress_view(
    pool: &SqlitePool,
    enrollment: &Enrollment,
) -> Result<ProgressView, AppError> {
    let completed_modules = completed_module_ids(pool, enrollment.id).await?;

    Ok(ProgressView {
        course_id: enrollment.course_id,
        completed_modules,
        score: enrollment.score,
        stats: ProgressStats {
            quizzes_taken: enrollment.quizzes_taken,
            average_score: enrollment.average_score,
        },
    })
}

async fn completed_module_ids(
    pool: &SqlitePool,
    enrollment_id: i64,
) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT cm.module_id
        FROM completed_modules cm
        JOIN modules m ON m.id = cm.module_id
        WHERE cm.enrollment_id = ?1
        ORDER BY m.position
        "#,
    )
    .bind(enrollment_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Enrolls the current user in a course.
///
/// POST /api/courses/{course_id}/enroll
/// At most one enrollment record exists per (user, course): a repeat
/// request is rejected with 409.
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user_id(&claims)?;

    let _course: i64 = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?1")
        .bind(course_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let result = sqlx::query(
        r#"
        INSERT INTO enrollments (user_id, course_id)
        VALUES (?1, ?2)
        ON CONFLICT (user_id, course_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Already enrolled in this course".to_string(),
        ));
    }

    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;
    let progress = progress_view(&pool, &enrollment).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Enrolled successfully",
            "progress": progress,
        })),
    ))
}

/// Returns the current user's progress in a course, including the
/// derived completion percentage.
///
/// GET /api/progress/{course_id}
pub async fn get_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user_id(&claims)?;
    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;

    let course = sqlx::query_as::<_, Course>(
        "SELECT id, title, description, created_at FROM courses WHERE id = ?1",
    )
    .bind(course_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let module_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM modules WHERE course_id = ?1")
            .bind(course_id)
            .fetch_one(&pool)
            .await?;

    let completed_modules = completed_module_ids(&pool, enrollment.id).await?;
    let completion = completion_percent(completed_modules.len() as i64, module_count);

    Ok(Json(json!({
        "course": course,
        "completedModules": completed_modules,
        "score": enrollment.score,
        "stats": ProgressStats {
            quizzes_taken: enrollment.quizzes_taken,
            average_score: enrollment.average_score,
        },
        "completionPercentage": completion,
    })))
}

/// Administrative bulk correction of a progress record.
///
/// PUT /api/progress/{course_id}
/// `completedModules` replaces the set wholesale; `score` and
/// `quizzesTaken` are added to the running totals and the average is
/// recomputed from the new totals, all inside one transaction.
pub async fn update_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = user_id(&claims)?;
    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;

    let mut tx = pool.begin().await?;

    if let Some(module_ids) = &payload.completed_modules {
        sqlx::query("DELETE FROM completed_modules WHERE enrollment_id = ?1")
            .bind(enrollment.id)
            .execute(&mut *tx)
            .await?;

        for module_id in module_ids {
            sqlx::query(
                r#"
                INSERT INTO completed_modules (enrollment_id, module_id)
                VALUES (?1, ?2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(enrollment.id)
            .bind(module_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    if payload.score.is_some() || payload.quizzes_taken.is_some() {
        let score_delta = payload.score.unwrap_or(0);
        let taken_delta = payload.quizzes_taken.unwrap_or(0);

        sqlx::query(
            r#"
            UPDATE enrollments
            SET score = score + ?1,
                quizzes_taken = quizzes_taken + ?2,
                average_score = CASE
                    WHEN quizzes_taken + ?2 > 0
                        THEN CAST(score + ?1 AS REAL) / (quizzes_taken + ?2)
                    ELSE 0
                END
            WHERE id = ?3
            "#,
        )
        .bind(score_delta)
        .bind(taken_delta)
        .bind(enrollment.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;
    let progress = progress_view(&pool, &enrollment).await?;

    Ok(Json(json!({
        "message": "Progress updated",
        "progress": progress,
    })))
}

/// Marks a module as completed for the current user.
///
/// POST /api/modules/{module_id}/complete
/// The module must belong to the request's course; a module already in
/// the completed set is rejected with 409, not silently ignored.
pub async fn complete_module(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(module_id): Path<i64>,
    Json(payload): Json<CompleteModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user_id(&claims)?;

    let course_id = payload
        .course_id
        .ok_or(AppError::BadRequest("courseId is required".to_string()))?;

    let module_course: i64 = sqlx::query_scalar("SELECT course_id FROM modules WHERE id = ?1")
        .bind(module_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Module not found".to_string()))?;

    if module_course != course_id {
        return Err(AppError::BadRequest(
            "Module does not belong to this course".to_string(),
        ));
    }

    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;

    // Atomic insert-if-absent: the primary key backs the duplicate check.
    let result = sqlx::query(
        r#"
        INSERT INTO completed_modules (enrollment_id, module_id)
        VALUES (?1, ?2)
        ON CONFLICT (enrollment_id, module_id) DO NOTHING
        "#,
    )
    .bind(enrollment.id)
    .bind(module_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Module already completed".to_string()));
    }

    let progress = progress_view(&pool, &enrollment).await?;

    Ok(Json(json!({
        "message": "Module marked as completed",
        "progress": progress,
    })))
}

/// Returns the quiz-review history for the current user's enrollment.
///
/// GET /api/progress/{course_id}/quizzes
/// Always returns concrete zero defaults for `stats` and `score` when
/// nothing has been submitted yet, never nulls.
pub async fn get_submitted_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = user_id(&claims)?;
    let enrollment = fetch_enrollment(&pool, user_id, course_id).await?;

    let submissions = sqlx::query_as::<_, SubmissionRow>(
        r#"
        SELECT quiz_id, score, details
        FROM quiz_submissions
        WHERE enrollment_id = ?1
        ORDER BY id
        "#,
    )
    .bind(enrollment.id)
    .fetch_all(&pool)
    .await?;

    let submitted_quizzes: Vec<SubmittedQuiz> =
        submissions.into_iter().map(SubmittedQuiz::from).collect();

    Ok(Json(json!({
        "submittedQuizzes": submitted_quizzes,
        "stats": ProgressStats {
            quizzes_taken: enrollment.quizzes_taken,
            average_score: enrollment.average_score,
        },
        "score": enrollment.score,
    })))
}
