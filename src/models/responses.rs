use serde::{Deserialize, Serialize};
use crate::models::domain::MatchResult;

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    #[serde(rename = "studentId")]
    pub student_id: i64,
    pub strategy: String,
    pub matches: Vec<MatchResult>,
}

/// Page of list results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub scorer: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
