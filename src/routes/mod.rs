// Route exports
pub mod accounts;
pub mod chat;
pub mod dating;
pub mod matches;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::auth::{CurrentUser, TokenVerifier};
use crate::error::AppError;
use crate::models::{HealthResponse, UserProfile};
use crate::services::{CacheManager, ChatService, ChatStore, DatingService, ProfileStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub dating: DatingService,
    pub chat: ChatService,
    pub auth: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        chats: Arc<dyn ChatStore>,
        cache: Arc<CacheManager>,
        auth: Arc<TokenVerifier>,
        feed_page_size: u64,
    ) -> Self {
        Self {
            dating: DatingService::new(profiles.clone(), cache, feed_page_size),
            chat: ChatService::new(chats, profiles.clone()),
            profiles,
            auth,
        }
    }

    /// The caller's own profile
    pub(crate) async fn profile_of(&self, user: &CurrentUser) -> Result<UserProfile, AppError> {
        Ok(self.profiles.get_profile_for_user(user.user_id).await?)
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(web::scope("/accounts").configure(accounts::configure))
        .service(web::scope("/dating").configure(dating::configure))
        .service(web::scope("/match").configure(matches::configure))
        .service(web::scope("/chat").configure(chat::configure));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match state.profiles.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// 302 to a fixed location
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, location.to_string()))
        .finish()
}
