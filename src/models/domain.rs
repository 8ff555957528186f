use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub type UserId = i64;
pub type ProfileId = i64;
pub type DialogId = i64;
pub type MessageId = i64;

/// Account record owning a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub date_joined: chrono::DateTime<chrono::Utc>,
}

/// Profile gender, stored and serialized as a single letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gender code: {0}")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            "O" | "o" => Ok(Gender::Other),
            other => Err(UnknownGender(other.to_string())),
        }
    }
}

/// Dating profile with demographic data and prior decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub age: u8,
    pub location: String,
    pub gender: Gender,
    pub gender_pref: Gender,
    pub from_age: u8,
    pub to_age: u8,
    pub about_me: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Profiles this user passed on
    #[serde(default)]
    pub skip_ids: BTreeSet<ProfileId>,
    /// Profiles this user liked
    #[serde(default)]
    pub like_ids: BTreeSet<ProfileId>,
}

impl UserProfile {
    /// True once this profile has decided on `other` in either direction
    pub fn has_decided_on(&self, other: ProfileId) -> bool {
        self.skip_ids.contains(&other) || self.like_ids.contains(&other)
    }
}

/// Editable subset of a profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub age: u8,
    pub location: String,
    pub gender: Gender,
    pub gender_pref: Gender,
    pub from_age: u8,
    pub to_age: u8,
    pub about_me: String,
    pub avatar: Option<String>,
}

impl ProfileChanges {
    pub fn apply(self, profile: &mut UserProfile) {
        profile.age = self.age;
        profile.location = self.location;
        profile.gender = self.gender;
        profile.gender_pref = self.gender_pref;
        profile.from_age = self.from_age;
        profile.to_age = self.to_age;
        profile.about_me = self.about_me;
        profile.avatar = self.avatar;
    }
}

/// Editable subset of a user record
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) {
        user.username = self.username;
        user.email = self.email;
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.password_hash = self.password_hash;
    }
}

/// Conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dialog {
    pub id: DialogId,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Single chat message, append-only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub dialog_id: DialogId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Candidate query parameters for the discovery feed
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub viewer_id: ProfileId,
    pub gender: Gender,
    pub min_age: u8,
    pub max_age: u8,
    pub exclude_ids: BTreeSet<ProfileId>,
}

impl CandidateQuery {
    /// Build the query implied by a viewer's preferences and past decisions
    pub fn for_viewer(viewer: &UserProfile) -> Self {
        let exclude_ids = viewer
            .skip_ids
            .iter()
            .chain(viewer.like_ids.iter())
            .copied()
            .collect();

        Self {
            viewer_id: viewer.id,
            gender: viewer.gender_pref,
            min_age: viewer.from_age,
            max_age: viewer.to_age,
            exclude_ids,
        }
    }

    pub fn exclude_ids_vec(&self) -> Vec<ProfileId> {
        self.exclude_ids.iter().copied().collect()
    }
}
