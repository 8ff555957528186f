use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::core::{filters::matches_candidate_query, latest_messages, Decision};
use crate::models::{
    CandidateQuery, Dialog, DialogId, Message, ProfileChanges, ProfileId, User, UserChanges,
    UserId, UserProfile,
};
use crate::services::store::{ChatStore, ProfileStore, StoreError};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    profiles: BTreeMap<ProfileId, UserProfile>,
    dialogs: BTreeMap<DialogId, Dialog>,
    messages: Vec<Message>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Process-local store used by tests and local runs without PostgreSQL
///
/// Records are created through the `insert_*` helpers, standing in for the
/// registration flow and chat transport that own creation in production.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, username: &str, email: &str) -> User {
        let mut state = self.state.write().await;
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            date_joined: chrono::Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_profile(
        &self,
        user_id: UserId,
        attributes: ProfileChanges,
    ) -> Result<UserProfile, StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }
        if state.profiles.values().any(|p| p.user_id == user_id) {
            return Err(StoreError::Conflict(format!("user {} already has a profile", user_id)));
        }

        let profile = UserProfile {
            id: state.next_id(),
            user_id,
            age: attributes.age,
            location: attributes.location,
            gender: attributes.gender,
            gender_pref: attributes.gender_pref,
            from_age: attributes.from_age,
            to_age: attributes.to_age,
            about_me: attributes.about_me,
            avatar: attributes.avatar,
            skip_ids: Default::default(),
            like_ids: Default::default(),
        };
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    pub async fn insert_dialog(&self, name: &str) -> Dialog {
        let mut state = self.state.write().await;
        let dialog = Dialog {
            id: state.next_id(),
            name: name.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.dialogs.insert(dialog.id, dialog.clone());
        dialog
    }

    pub async fn insert_message(
        &self,
        dialog_id: DialogId,
        sender_id: UserId,
        text: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Result<Message, StoreError> {
        let mut state = self.state.write().await;
        if !state.dialogs.contains_key(&dialog_id) {
            return Err(StoreError::NotFound(format!("dialog {}", dialog_id)));
        }
        let sender_username = state
            .users
            .get(&sender_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| StoreError::NotFound(format!("user {}", sender_id)))?;

        let message = Message {
            id: state.next_id(),
            dialog_id,
            sender_id,
            sender_username,
            text: text.to_string(),
            timestamp,
        };
        state.messages.push(message.clone());
        Ok(message)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        let state = self.state.read().await;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", username)))
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let taken = state
            .users
            .values()
            .any(|u| u.id != id && u.username == changes.username);
        if taken {
            return Err(StoreError::Conflict(format!(
                "username '{}' is taken",
                changes.username
            )));
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        changes.apply(user);
        Ok(user.clone())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<UserProfile, StoreError> {
        let state = self.state.read().await;
        state
            .profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))
    }

    async fn get_profile_for_user(&self, user_id: UserId) -> Result<UserProfile, StoreError> {
        let state = self.state.read().await;
        state
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("profile of user {}", user_id)))
    }

    async fn get_profiles(&self, ids: &[ProfileId]) -> Result<Vec<UserProfile>, StoreError> {
        let state = self.state.read().await;
        let wanted: std::collections::BTreeSet<ProfileId> = ids.iter().copied().collect();
        Ok(wanted
            .iter()
            .filter_map(|id| state.profiles.get(id))
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        id: ProfileId,
        changes: ProfileChanges,
    ) -> Result<UserProfile, StoreError> {
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;
        changes.apply(profile);
        Ok(profile.clone())
    }

    async fn count_candidates(&self, query: &CandidateQuery) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        let total = state
            .profiles
            .values()
            .filter(|p| matches_candidate_query(p, query))
            .count();
        Ok(total as u64)
    }

    async fn fetch_candidates(
        &self,
        query: &CandidateQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let state = self.state.read().await;
        // BTreeMap iteration is ordered by id
        Ok(state
            .profiles
            .values()
            .filter(|p| matches_candidate_query(p, query))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn record_decision(
        &self,
        profile_id: ProfileId,
        target_id: ProfileId,
        decision: Decision,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.profiles.contains_key(&target_id) {
            return Err(StoreError::NotFound(format!("profile {}", target_id)));
        }
        let profile = state
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", profile_id)))?;

        let added = decision.apply(profile, target_id);
        tracing::debug!(
            "Recorded {}: {} -> {} ({} new)",
            decision,
            profile_id,
            target_id,
            u8::from(added)
        );
        Ok(())
    }

    async fn liked_profiles(&self, profile_id: ProfileId) -> Result<Vec<UserProfile>, StoreError> {
        let state = self.state.read().await;
        let profile = state
            .profiles
            .get(&profile_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", profile_id)))?;

        Ok(profile
            .like_ids
            .iter()
            .filter_map(|id| state.profiles.get(id))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn get_dialog(&self, id: DialogId) -> Result<Dialog, StoreError> {
        let state = self.state.read().await;
        state
            .dialogs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("dialog {}", id)))
    }

    async fn recent_messages(
        &self,
        dialog_id: DialogId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        if !state.dialogs.contains_key(&dialog_id) {
            return Err(StoreError::NotFound(format!("dialog {}", dialog_id)));
        }

        let in_dialog = state
            .messages
            .iter()
            .filter(|m| m.dialog_id == dialog_id)
            .cloned();
        Ok(latest_messages(in_dialog, limit))
    }
}
