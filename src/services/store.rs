use async_trait::async_trait;
use thiserror::Error;

use crate::core::Decision;
use crate::models::{
    CandidateQuery, Dialog, DialogId, Message, ProfileChanges, ProfileId, User, UserChanges,
    UserId, UserProfile,
};

/// Errors that can occur when reading or writing persisted records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Users, profiles and the like/skip sets between profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Fails with `Conflict` if the new username belongs to another user
    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, StoreError>;

    async fn get_profile(&self, id: ProfileId) -> Result<UserProfile, StoreError>;

    async fn get_profile_for_user(&self, user_id: UserId) -> Result<UserProfile, StoreError>;

    /// Current state of each listed profile, ordered by id; unknown ids are skipped
    async fn get_profiles(&self, ids: &[ProfileId]) -> Result<Vec<UserProfile>, StoreError>;

    async fn update_profile(
        &self,
        id: ProfileId,
        changes: ProfileChanges,
    ) -> Result<UserProfile, StoreError>;

    /// Number of profiles matching the query
    async fn count_candidates(&self, query: &CandidateQuery) -> Result<u64, StoreError>;

    /// Matching profiles ordered by id, `offset`/`limit` applied
    async fn fetch_candidates(
        &self,
        query: &CandidateQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<UserProfile>, StoreError>;

    /// Idempotent; both profiles must exist
    async fn record_decision(
        &self,
        profile_id: ProfileId,
        target_id: ProfileId,
        decision: Decision,
    ) -> Result<(), StoreError>;

    /// Profiles in `profile_id`'s like set, each with its own like set loaded
    async fn liked_profiles(&self, profile_id: ProfileId) -> Result<Vec<UserProfile>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Read access to conversations
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get_dialog(&self, id: DialogId) -> Result<Dialog, StoreError>;

    /// Newest-first, at most `limit`; `NotFound` for an unknown dialog
    async fn recent_messages(
        &self,
        dialog_id: DialogId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;
}
