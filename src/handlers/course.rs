// src/handlers/course.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{Course, CreateCourseRequest, CreateModuleRequest, Module},
        quiz::{CreateQuizRequest, PublicQuestion, Question, Quiz},
    },
};

/// Query parameters for listing courses.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
}

/// Lists all courses, optionally filtered by a title search keyword.
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, title, description, created_at
        FROM courses
        WHERE (?1 IS NULL OR title LIKE ?1)
        ORDER BY id
        "#,
    )
    .bind(search_pattern)
    .fetch_all(&pool)
    .await?;

    Ok(Json(courses))
}

/// Retrieves a single course with its module list and quiz summaries.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = sqlx::query_as::<_, Course>(
        "SELECT id, title, description, created_at FROM courses WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let modules = sqlx::query_as::<_, Module>(
        r#"
        SELECT id, course_id, title, content_type, position
        FROM modules
        WHERE course_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT id, course_id, title FROM quizzes WHERE course_id = ?1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "course": course,
        "modules": modules,
        "quizzes": quizzes,
    })))
}

/// Retrieves a quiz's question list for taking it.
/// Answers are stripped via the `PublicQuestion` DTO.
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        "SELECT id, course_id, title FROM quizzes WHERE id = ?1",
    )
    .bind(id)
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
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let public_questions: Vec<PublicQuestion> =
        questions.into_iter().map(PublicQuestion::from).collect();

    Ok(Json(json!({
        "quiz": quiz,
        "questions": public_questions,
    })))
}

/// Creates a new course.
/// Admin only.
pub async fn create_course(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO courses (title, description)
        VALUES (?1, ?2)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(payload.description.unwrap_or_default())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

/// Adds a module to an existing course.
/// Admin only. When `position` is omitted the module is appended.
pub async fn create_module(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let _course: i64 = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?1")
        .bind(course_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let position = match payload.position {
        Some(p) => p,
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM modules WHERE course_id = ?1",
            )
            .bind(course_id)
            .fetch_one(&pool)
            .await?
        }
    };

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO modules (course_id, title, content_type, position)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(course_id)
    .bind(&payload.title)
    .bind(&payload.content_type)
    .bind(position)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

/// Creates a quiz together with its question list.
/// Admin only. Questions keep their request order.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let _course: i64 = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?1")
        .bind(payload.course_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    let mut tx = pool.begin().await?;

    let quiz_id: i64 = sqlx::query_scalar(
        "INSERT INTO quizzes (course_id, title) VALUES (?1, ?2) RETURNING id",
    )
    .bind(payload.course_id)
    .bind(&payload.title)
    .fetch_one(&mut *tx)
    .await?;

    for (position, question) in payload.questions.iter().enumerate() {
        let options =
            serde_json::to_string(question.options.as_deref().unwrap_or_default())?;

        sqlx::query(
            r#"
            INSERT INTO questions (quiz_id, question_type, content, options, answer, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(quiz_id)
        .bind(&question.question_type)
        .bind(&question.content)
        .bind(options)
        .bind(&question.answer)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(json!({"id": quiz_id}))))
}
