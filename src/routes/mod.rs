// Route exports
pub mod applications;
pub mod catalog;
pub mod matches;

use actix_web::{error, web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;

use crate::config::Settings;
use crate::core::{ApplicationWorkflow, Catalog, Page, RankingEngine, Scorer};
use crate::error::ServiceError;
use crate::models::{ApplicationStatus, HealthResponse};
use crate::services::EntityCache;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub ranking: Arc<RankingEngine>,
    pub workflow: Arc<ApplicationWorkflow>,
    pub catalog: Arc<Catalog>,
    pub cache: Arc<EntityCache>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the use-case services around one cache and one scorer
    pub fn new(cache: Arc<EntityCache>, scorer: Arc<dyn Scorer>, settings: Settings) -> Self {
        let ranking = RankingEngine::new(Arc::clone(&cache), scorer, settings.ranking.options());
        Self {
            ranking: Arc::new(ranking),
            workflow: Arc::new(ApplicationWorkflow::new(Arc::clone(&cache))),
            catalog: Arc::new(Catalog::new(Arc::clone(&cache))),
            cache,
            settings: Arc::new(settings),
        }
    }

    pub(crate) fn page(&self, page: Option<i64>, size: Option<i64>) -> Page {
        Page::new(page, size, self.settings.listing.default_page_size)
    }
}

/// Blank or missing status filters mean "any status"
pub(crate) fn parse_status_filter(raw: Option<&str>) -> Result<Option<ApplicationStatus>, ServiceError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<ApplicationStatus>().map_err(ServiceError::Validation))
        .transpose()
}

/// Render malformed JSON bodies as a JSON 400
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ServiceError::validation(format!("invalid JSON: {}", err)).into()
}

/// Render malformed query strings as a JSON 400
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    ServiceError::validation(format!("invalid query: {}", err)).into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(matches::configure)
            .configure(applications::configure)
            .configure(catalog::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.cache.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        scorer: state.ranking.scorer_name().to_string(),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::SimpleScorer;
    use crate::services::{MemoryStore, Store};
    use std::time::Duration;

    pub fn state() -> AppState {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let cache = Arc::new(EntityCache::new(store, 1000, Duration::from_secs(60)));
        AppState::new(cache, Arc::new(SimpleScorer::new()), Settings::default())
    }
}
