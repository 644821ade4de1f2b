use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use research_match::config::{LoggingSettings, Settings, StoreBackend};
use research_match::core::{Scorer, SimpleScorer};
use research_match::routes::{self, AppState};
use research_match::services::{EntityCache, MemoryStore, PostgresStore, SemanticScorer, Store, StoreError};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn Store>, StoreError> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let db = &settings.database;
            let store = PostgresStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await?;
            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
    }
}

/// Pick the scorer once for the process lifetime
fn build_scorer(settings: &Settings) -> Arc<dyn Scorer> {
    if !settings.use_semantic() {
        info!("Using the simple coverage scorer");
        return Arc::new(SimpleScorer::new());
    }

    let semantic = &settings.semantic;
    match SemanticScorer::new(
        semantic.base_url.clone(),
        semantic.api_key.clone(),
        semantic.model.clone(),
        semantic.timeout(),
    ) {
        Ok(scorer) => {
            info!("Using the semantic scorer ({} at {})", scorer.model(), semantic.base_url);
            Arc::new(scorer)
        }
        Err(e) => {
            error!("Semantic scorer unavailable ({}), falling back to simple", e);
            Arc::new(SimpleScorer::new())
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);
    info!("Starting research-match service...");
    info!("Configuration loaded: {:?}", settings.semantic);

    let store = build_store(&settings).await.map_err(|e| {
        error!("Failed to initialize the store: {}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    let cache = Arc::new(EntityCache::new(
        store,
        settings.cache.max_entries,
        settings.cache.ttl(),
    ));
    info!(
        "Entity cache initialized ({} entries, TTL: {}s)",
        settings.cache.max_entries, settings.cache.ttl_secs
    );

    let scorer = build_scorer(&settings);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    let app_state = AppState::new(cache, scorer, settings);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
