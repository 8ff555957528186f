use actix_web::{web, HttpResponse};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{MatchListPage, ProfileCard};
use crate::routes::AppState;

/// Configure match list routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(mutual_matches));
}

/// Profiles the caller liked that liked the caller back
///
/// GET /match/
async fn mutual_matches(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let viewer = state.profile_of(&user).await?;
    let matches = state.dating.mutual_matches(&viewer).await?;

    tracing::info!("Returning {} matches for profile {}", matches.len(), viewer.id);

    Ok(HttpResponse::Ok().json(MatchListPage {
        total: matches.len(),
        matches: matches.iter().map(ProfileCard::from).collect(),
    }))
}
