use actix_web::{web, HttpResponse};

use crate::auth::CurrentUser;
use crate::core::{Decision, PageRequest};
use crate::error::AppError;
use crate::models::{FeedPage, FeedQuery, ProfileCard, ProfileId};
use crate::routes::{redirect, AppState};

const FEED_URL: &str = "/dating/";

/// Configure discovery feed routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(discovery_feed))
        .route("/{operation}/{profile_id}/", web::get().to(record_decision));
}

/// Discovery feed
///
/// GET /dating/?page=N
///
/// `page` is a positive integer or `last`. Pages past the end are 404,
/// except page 1 of an empty feed.
async fn discovery_feed(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse, AppError> {
    let request = PageRequest::parse_optional(query.page.as_deref())?;
    let viewer = state.profile_of(&user).await?;

    let feed = state.dating.discovery_page(&viewer, request).await?;

    Ok(HttpResponse::Ok().json(FeedPage {
        candidates: feed.candidates.iter().map(ProfileCard::from).collect(),
        page: feed.window.into(),
    }))
}

/// GET /dating/{like|skip}/{profile_id}/
async fn record_decision(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<(String, ProfileId)>,
) -> Result<HttpResponse, AppError> {
    let (operation, target_id) = path.into_inner();
    let decision: Decision = operation.parse()?;
    let viewer = state.profile_of(&user).await?;

    state.dating.record_decision(&viewer, target_id, decision).await?;

    Ok(redirect(FEED_URL))
}
