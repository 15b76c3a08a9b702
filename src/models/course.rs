// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'modules' table in the database.
/// `position` drives display order; completed-module lists follow it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: i64,
    pub course_id: i64,
    pub title: String,

    /// Module content type: 'video' or 'text'.
    pub content_type: String,

    pub position: i64,
}

/// DTO for creating a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// DTO for adding a module to a course.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(custom(function = validate_content_type))]
    pub content_type: String,
    pub position: Option<i64>,
}

fn validate_content_type(content_type: &str) -> Result<(), validator::ValidationError> {
    match content_type {
        "video" | "text" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_content_type")),
    }
}
