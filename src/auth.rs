//! Request authentication and credential hashing.
//!
//! Tokens are issued by the external login flow; this service only checks
//! them and turns the claims into an explicit [`CurrentUser`].

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::future::{ready, Ready};
use thiserror::Error;

use crate::config::AuthSettings;
use crate::error::AppError;
use crate::models::UserId;
use crate::routes::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No credentials supplied")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid subject claim: {0}")]
    InvalidSubject(String),
}

/// JWT claims carried by session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub username: String,
}

/// Validates bearer tokens and session cookies
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
    login_url: String,
}

impl TokenVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            cookie_name: settings.cookie_name.clone(),
            login_url: settings.login_url.clone(),
        }
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidSubject(data.claims.sub.clone()))?;

        Ok(CurrentUser {
            user_id,
            username: data.claims.username,
        })
    }

    /// Bearer header first, then the session cookie
    fn token_from_request(&self, req: &HttpRequest) -> Option<String> {
        let bearer = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());

        bearer.or_else(|| req.cookie(&self.cookie_name).map(|c| c.value().to_string()))
    }

    pub fn authenticate(&self, req: &HttpRequest) -> Result<CurrentUser, AuthError> {
        let token = self.token_from_request(req).ok_or(AuthError::MissingToken)?;
        self.verify(&token)
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state,
            None => return ready(Err(AppError::Internal("application state missing".into()))),
        };

        let result = state.auth.authenticate(req).map_err(|e| {
            tracing::debug!("Rejected unauthenticated request to {}: {}", req.path(), e);
            AppError::AuthRequired {
                login_url: state.auth.login_url().to_string(),
                next: req
                    .uri()
                    .path_and_query()
                    .map_or(req.path(), |pq| pq.as_str())
                    .to_string(),
            }
        });
        ready(result)
    }
}

/// Sign a session token; used by the login flow and tests
pub fn issue_token(
    secret: &str,
    user_id: UserId,
    username: &str,
    ttl: chrono::Duration,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

const HASH_ALGORITHM: &str = "pbkdf2_sha256";
pub const PASSWORD_ITERATIONS: u32 = 260_000;
const HASH_LEN: usize = 32;

fn derive_key(raw: &str, salt: &str, iterations: u32) -> [u8; HASH_LEN] {
    let mut key = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(raw.as_bytes(), salt.as_bytes(), iterations, &mut key);
    key
}

/// Hash a password as `pbkdf2_sha256$<iterations>$<salt>$<hex key>`
pub fn hash_password(raw: &str) -> String {
    hash_password_with_iterations(raw, PASSWORD_ITERATIONS)
}

pub fn hash_password_with_iterations(raw: &str, iterations: u32) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let key = derive_key(raw, &salt, iterations);
    format!("{}${}${}${}", HASH_ALGORITHM, iterations, salt, hex::encode(key))
}

/// Check `raw` against a stored hash; unknown formats never verify
pub fn verify_password(raw: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (iterations, salt, expected) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(HASH_ALGORITHM), Some(iterations), Some(salt), Some(key)) => {
            match (iterations.parse::<u32>(), hex::decode(key)) {
                (Ok(iterations), Ok(expected)) if iterations > 0 => (iterations, salt, expected),
                _ => return false,
            }
        }
        _ => return false,
    };

    let actual = derive_key(raw, salt, iterations);
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
