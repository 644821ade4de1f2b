use actix_web::{web, HttpResponse};
use validator::Validate;

use super::AppState;
use crate::error::ServiceError;
use crate::models::{AnalyzeQuery, RankQuery, RankResponse};

/// Configure all ranking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/matches", web::get().to(rank_projects))
        .route("/matches/analyze", web::get().to(analyze_applications));
}

/// Rank projects for a student
///
/// GET /api/v1/matches?studentId=1&fast=0&topK=5
async fn rank_projects(
    state: web::Data<AppState>,
    query: web::Query<RankQuery>,
) -> Result<HttpResponse, ServiceError> {
    query.validate()?;

    let matches = state
        .ranking
        .rank(query.student_id, query.fast, query.top_k)
        .await?;

    let strategy = if query.fast { "simple" } else { state.ranking.scorer_name() };

    Ok(HttpResponse::Ok().json(RankResponse {
        student_id: query.student_id,
        strategy: strategy.to_string(),
        matches,
    }))
}

/// Score every application to a teacher's projects
///
/// GET /api/v1/matches/analyze?teacherId=3&projectId=7&fast=1
async fn analyze_applications(
    state: web::Data<AppState>,
    query: web::Query<AnalyzeQuery>,
) -> Result<HttpResponse, ServiceError> {
    query.validate()?;

    let analysis = state
        .ranking
        .analyze(query.teacher_id, query.project_id, query.fast)
        .await?;

    Ok(HttpResponse::Ok().json(analysis))
}
