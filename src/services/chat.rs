use std::sync::Arc;

use crate::core::RECENT_MESSAGES_LIMIT;
use crate::error::AppError;
use crate::models::{Dialog, DialogId, Message, User};
use crate::services::store::{ChatStore, ProfileStore};

/// Conversation history lookups behind the chat pages
#[derive(Clone)]
pub struct ChatService {
    chats: Arc<dyn ChatStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { chats, profiles }
    }

    /// Up to ten most recent messages, newest first
    pub async fn get_last_10_messages(&self, dialog_id: DialogId) -> Result<Vec<Message>, AppError> {
        let messages = self
            .chats
            .recent_messages(dialog_id, RECENT_MESSAGES_LIMIT)
            .await?;
        tracing::debug!("Loaded {} messages for dialog {}", messages.len(), dialog_id);
        Ok(messages)
    }

    pub async fn get_current_chat(&self, dialog_id: DialogId) -> Result<Dialog, AppError> {
        Ok(self.chats.get_dialog(dialog_id).await?)
    }

    pub async fn get_user_contact(&self, username: &str) -> Result<User, AppError> {
        Ok(self.profiles.find_user_by_username(username).await?)
    }
}
