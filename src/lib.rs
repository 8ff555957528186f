//! Lume Dating - profile, discovery and chat service for the Lume dating app
//!
//! Profiles are shown one candidate at a time on the discovery feed; likes
//! and skips remove a candidate for good, and two profiles that like each
//! other become a match. The chat surface exposes dialog history.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use auth::{issue_token, CurrentUser, TokenVerifier};
pub use self::core::{filter_candidates, resolve_mutual_matches, Decision, PageRequest, Paginator};
pub use error::AppError;
pub use models::{CandidateQuery, Gender, Message, User, UserProfile};
pub use routes::{configure_routes, AppState};
