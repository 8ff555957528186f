use serde::{Deserialize, Serialize};

use crate::core::PageInfo;
use crate::models::domain::{Dialog, Gender, Message, ProfileId, User, UserProfile};
use crate::models::requests::{FieldErrors, ProfileForm, UserFormView};

/// Public view of another user's profile, without their decision sets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileCard {
    pub id: ProfileId,
    pub age: u8,
    pub location: String,
    pub gender: Gender,
    pub about_me: String,
    pub avatar: Option<String>,
}

impl From<&UserProfile> for ProfileCard {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            age: profile.age,
            location: profile.location.clone(),
            gender: profile.gender,
            about_me: profile.about_me.clone(),
            avatar: profile.avatar.clone(),
        }
    }
}

/// GET /accounts/login/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPage {
    pub next: Option<String>,
}

/// GET /accounts/profile/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePage {
    pub user: User,
    pub profile: UserProfile,
}

/// GET/POST /accounts/profile/edit/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFormPage {
    pub form: ProfileForm,
    pub errors: FieldErrors,
}

/// GET/POST /accounts/user/edit/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFormPage {
    pub form: UserFormView,
    pub errors: FieldErrors,
}

/// GET /dating/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub candidates: Vec<ProfileCard>,
    pub page: PageInfo,
}

/// GET /match/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListPage {
    pub matches: Vec<ProfileCard>,
    pub total: usize,
}

/// GET /chat/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLandingPage {
    pub username: Option<String>,
}

/// GET /chat/{room_name}/
///
/// Both fields are JSON-encoded strings for the client script to embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPage {
    pub room_name_json: String,
    pub username: String,
}

/// GET /chat/dialogs/{id}/messages/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesPage {
    pub dialog: Dialog,
    pub messages: Vec<Message>,
}

/// GET /chat/contacts/{username}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPage {
    pub contact: User,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
