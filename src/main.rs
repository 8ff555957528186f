use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lume_dating::config::{CacheSettings, LoggingSettings, Settings};
use lume_dating::error::{handle_form_payload_error, handle_query_payload_error};
use lume_dating::routes::{self, AppState};
use lume_dating::services::{CacheManager, PostgresStore};
use lume_dating::TokenVerifier;

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

/// Redis when configured and reachable, otherwise the local tier alone
async fn build_cache(settings: &CacheSettings) -> CacheManager {
    let Some(redis_url) = settings.redis_url.as_deref() else {
        info!("No Redis configured, using local cache only");
        return CacheManager::local(settings.l1_cache_size, settings.ttl_secs);
    };

    match CacheManager::new(redis_url, settings.l1_cache_size, settings.ttl_secs).await {
        Ok(cache) => {
            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s)",
                settings.l1_cache_size, settings.ttl_secs
            );
            cache
        }
        Err(e) => {
            warn!("Failed to connect to Redis ({}), falling back to local cache", e);
            CacheManager::local(settings.l1_cache_size, settings.ttl_secs)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);
    info!("Starting Lume dating service...");

    let store = Arc::new(PostgresStore::from_settings(&settings.database).await.map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?);

    info!(
        "PostgreSQL store initialized (max: {} connections)",
        settings.database.max_connections
    );

    let cache = Arc::new(build_cache(&settings.cache).await);
    let auth = Arc::new(TokenVerifier::new(&settings.auth));

    let app_state = AppState::new(
        store.clone(),
        store,
        cache,
        auth,
        settings.feed.page_size,
    );

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::FormConfig::default().error_handler(handle_form_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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
