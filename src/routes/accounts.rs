use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::auth::{hash_password, CurrentUser};
use crate::error::AppError;
use crate::models::{
    field_errors, FieldErrors, LoginPage, LoginQuery, ProfileForm, ProfileFormPage, ProfilePage,
    UserChanges, UserForm, UserFormPage, UserFormView,
};
use crate::routes::{redirect, AppState};

const PROFILE_URL: &str = "/accounts/profile/";

/// Configure profile and account routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/login/", web::get().to(login_page))
        .route("/profile/", web::get().to(profile_detail))
        .route("/profile/edit/", web::get().to(profile_edit_form))
        .route("/profile/edit/", web::post().to(profile_edit_submit))
        .route("/user/edit/", web::get().to(user_edit_form))
        .route("/user/edit/", web::post().to(user_edit_submit));
}

/// GET /accounts/login/
///
/// Credentials are checked by the external login flow; this only carries
/// the `next` target.
async fn login_page(query: web::Query<LoginQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPage {
        next: query.into_inner().next,
    })
}

/// GET /accounts/profile/
async fn profile_detail(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let account = state.profiles.get_user(user.user_id).await?;
    let profile = state.profile_of(&user).await?;

    Ok(HttpResponse::Ok().json(ProfilePage {
        user: account,
        profile,
    }))
}

async fn profile_edit_form(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let profile = state.profile_of(&user).await?;

    Ok(HttpResponse::Ok().json(ProfileFormPage {
        form: ProfileForm::from_profile(&profile),
        errors: FieldErrors::new(),
    }))
}

async fn profile_edit_submit(
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let profile = state.profile_of(&user).await?;

    let changes = match form.clean() {
        Ok(changes) => changes,
        Err(errors) => {
            tracing::info!(
                "Profile form rejected for user {}: {:?}",
                user.user_id,
                errors.keys().collect::<Vec<_>>()
            );
            return Ok(HttpResponse::BadRequest().json(ProfileFormPage { form, errors }));
        }
    };

    state.profiles.update_profile(profile.id, changes).await?;
    tracing::info!("Updated profile {} for user {}", profile.id, user.user_id);

    Ok(redirect(PROFILE_URL))
}

async fn user_edit_form(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let account = state.profiles.get_user(user.user_id).await?;

    Ok(HttpResponse::Ok().json(UserFormPage {
        form: UserFormView::from(&account),
        errors: FieldErrors::new(),
    }))
}

async fn user_edit_submit(
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<UserForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    if let Err(errors) = form.validate() {
        tracing::info!("User form rejected for user {}: {}", user.user_id, errors);
        return Ok(HttpResponse::BadRequest().json(UserFormPage {
            form: UserFormView::from(&form),
            errors: field_errors(&errors),
        }));
    }

    let view = UserFormView::from(&form);
    let changes = UserChanges {
        password_hash: hash_password(&form.password1),
        username: form.username,
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
    };

    match state.profiles.update_user(user.user_id, changes).await {
        Ok(updated) => {
            tracing::info!("Updated account {} ({})", updated.id, updated.username);
            Ok(redirect(PROFILE_URL))
        }
        Err(crate::services::StoreError::Conflict(reason)) => {
            tracing::info!("Username change rejected for user {}: {}", user.user_id, reason);
            let mut errors = FieldErrors::new();
            errors.insert(
                "username".to_string(),
                vec!["A user with that username already exists.".to_string()],
            );
            Ok(HttpResponse::BadRequest().json(UserFormPage { form: view, errors }))
        }
        Err(e) => Err(e.into()),
    }
}
