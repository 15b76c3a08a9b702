// src/handlers/admin.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    progress::{completion_percent, safe_ratio},
};

/// Per-enrollment completion shape consumed by the engagement scan.
#[derive(sqlx::FromRow)]
struct EngagementRow {
    completed: i64,
    module_count: i64,
}

/// Platform-wide engagement metrics.
/// Admin only.
///
/// GET /api/admin/stats
/// Engagement rate is the rounded mean of every enrollment's completion
/// percentage; an enrollment whose course no longer resolves counts as
/// 0% instead of failing the whole scan. Full-table scan, acceptable at
/// this platform's scale.
pub async fn platform_stats(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let total_students: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'student'")
            .fetch_one(&pool)
            .await?;

    let total_admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(&pool)
        .await?;

    let total_courses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(&pool)
        .await?;

    let rows = sqlx::query_as::<_, EngagementRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM completed_modules cm WHERE cm.enrollment_id = e.id) AS completed,
            (SELECT COUNT(*) FROM modules m WHERE m.course_id = e.course_id) AS module_count
        FROM enrollments e
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to scan enrollments for stats: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let total_enrollments = rows.len() as i64;
    let percent_sum: i64 = rows
        .iter()
        .map(|row| completion_percent(row.completed, row.module_count))
        .sum();
    let engagement_rate = safe_ratio(percent_sum, total_enrollments).round() as i64;

    Ok(Json(json!({
        "totalStudents": total_students,
        "totalAdmins": total_admins,
        "totalCourses": total_courses,
        "totalEnrollments": total_enrollments,
        "engagementRate": engagement_rate,
    })))
}
