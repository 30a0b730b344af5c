//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProfileImage;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub cover: String,
    pub profile_img: Option<ProfileImage>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload, assembled by the registration workflow
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Plain-text password; hashed by the repository on insert
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_img: Option<ProfileImage>,
}

/// Partial profile update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub cover: Option<String>,
}

/// Public view of a user, safe to return to any caller
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_img: Option<ProfileImage>,
    pub cover: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_img: user.profile_img,
            cover: user.cover,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Author summary embedded in video and comment responses
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_img: Option<ProfileImage>,
}
