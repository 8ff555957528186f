use actix_web::{web, HttpResponse};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{ChatLandingPage, ContactPage, DialogId, MessagesPage, RoomPage};
use crate::routes::AppState;

/// Configure chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(chat_landing))
        .route("/dialogs/{dialog_id}/messages/", web::get().to(dialog_messages))
        .route("/contacts/{username}/", web::get().to(contact_detail))
        .route("/{room_name}/", web::get().to(room));
}

/// GET /chat/, open to anonymous callers
async fn chat_landing(user: Option<CurrentUser>) -> HttpResponse {
    HttpResponse::Ok().json(ChatLandingPage {
        username: user.map(|u| u.username),
    })
}

/// GET /chat/{room_name}/
///
/// Both fields are JSON string literals, ready to embed in a script tag.
async fn room(user: CurrentUser, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let room_name = path.into_inner();

    let page = RoomPage {
        room_name_json: json_literal(&room_name)?,
        username: json_literal(&user.username)?,
    };
    tracing::debug!("User {} joined room {}", user.user_id, room_name);

    Ok(HttpResponse::Ok().json(page))
}

fn json_literal(value: &str) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::Internal(e.to_string()))
}

async fn dialog_messages(
    state: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<DialogId>,
) -> Result<HttpResponse, AppError> {
    let dialog_id = path.into_inner();
    let dialog = state.chat.get_current_chat(dialog_id).await?;
    let messages = state.chat.get_last_10_messages(dialog.id).await?;

    Ok(HttpResponse::Ok().json(MessagesPage { dialog, messages }))
}

async fn contact_detail(
    state: web::Data<AppState>,
    _user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let contact = state.chat.get_user_contact(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ContactPage { contact }))
}
