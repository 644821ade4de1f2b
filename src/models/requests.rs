use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Accepts `true`/`false`, `1`/`0` and `yes`/`no` for boolean query flags.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(value) => Ok(value != 0),
        Flag::Text(text) => match text.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "" | "0" | "false" | "no" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag value `{}`", other))),
        },
    }
}

fn default_true() -> bool {
    true
}

/// Query for ranking projects for a student
///
/// GET /api/v1/matches?studentId=1&fast=1&topK=5
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "student_id", rename = "studentId")]
    pub student_id: i64,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub fast: bool,
    #[serde(alias = "top_k", rename = "topK", default)]
    pub top_k: Option<i64>,
}

/// Query for a teacher's application analysis
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzeQuery {
    #[validate(range(min = 1))]
    #[serde(alias = "teacher_id", rename = "teacherId")]
    pub teacher_id: i64,
    #[serde(alias = "project_id", rename = "projectId", default)]
    pub project_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub fast: bool,
}

/// Request to submit an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    #[serde(alias = "student_id", rename = "studentId", default)]
    pub student_id: i64,
    #[serde(alias = "project_id", rename = "projectId", default)]
    pub project_id: i64,
}

/// Request to move an application to a new status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(alias = "application_id", rename = "applicationId")]
    pub application_id: i64,
    #[serde(default)]
    pub status: String,
}

/// Admin listing of applications with scores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListApplicationsQuery {
    #[serde(alias = "project_id", rename = "projectId", default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(alias = "page_size", rename = "pageSize", default)]
    pub page_size: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub fast: bool,
}

/// Listing of one student's own applications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentApplicationsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub fast: bool,
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub scores: bool,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(alias = "page_size", rename = "pageSize", default)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(alias = "page_size", rename = "pageSize", default)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(range(min = 1))]
    #[serde(alias = "teacher_id", rename = "teacherId", default)]
    pub teacher_id: i64,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(alias = "teacher_id", rename = "teacherId", default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(alias = "page_size", rename = "pageSize", default)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default = "default_true")]
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackingRequest {
    #[serde(alias = "application_id", rename = "applicationId")]
    pub application_id: i64,
    #[validate(length(min = 1))]
    pub progress: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationScopedQuery {
    #[serde(alias = "application_id", rename = "applicationId")]
    pub application_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[serde(alias = "from_user_id", rename = "fromUserId", default)]
    pub from_user_id: i64,
    #[serde(alias = "to_user_id", rename = "toUserId", default)]
    pub to_user_id: i64,
    #[serde(alias = "application_id", rename = "applicationId", default)]
    pub application_id: i64,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentRequest {
    #[serde(alias = "application_id", rename = "applicationId")]
    pub application_id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub path: String,
}
