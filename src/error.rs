use actix_web::{error, http::header, http::StatusCode, HttpRequest, HttpResponse};
use thiserror::Error;

use crate::core::{PageError, UnknownDecision};
use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired { login_url: String, next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::AuthRequired { .. } => "auth_required",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Store(_) | AppError::Internal(_) => "internal_error",
        }
    }

    /// Login URL with the original path as `next`
    pub fn login_redirect_target(login_url: &str, next: &str) -> String {
        format!("{}?next={}", login_url, urlencoding::encode(next))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Conflict(what) => AppError::Conflict(what),
            other => AppError::Store(other),
        }
    }
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<UnknownDecision> for AppError {
    fn from(err: UnknownDecision) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthRequired { .. } => StatusCode::FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::AuthRequired { login_url, next } = self {
            return HttpResponse::Found()
                .insert_header((header::LOCATION, Self::login_redirect_target(login_url, next)))
                .finish();
        }

        let status = self.status_code();
        let message = match self {
            AppError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                "An internal error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal failure: {}", e);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// Handle malformed urlencoded form bodies
pub fn handle_form_payload_error(err: error::UrlencodedError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Form payload error on {}: {}", req.path(), err);
    AppError::BadRequest(format!("Invalid form: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query: {}", err)).into()
}
