//! Short-form video model and related payloads

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{FileDescriptor, user::UserSummary, video::MediaProperties};

/// Short entity; the same shape as a video minus tags, reactions and comments
#[derive(Debug, Clone, Serialize)]
pub struct Short {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub views: i32,
    pub src: FileDescriptor,
    pub thumbnail: FileDescriptor,
    pub properties: MediaProperties,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New short payload, assembled by the upload workflow
#[derive(Debug, Clone)]
pub struct NewShort {
    pub title: String,
    pub description: String,
    pub src: FileDescriptor,
    pub thumbnail: FileDescriptor,
    pub properties: MediaProperties,
    pub user_id: Uuid,
}

/// Full short detail returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct ShortResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub views: i32,
    pub src: FileDescriptor,
    pub thumbnail: FileDescriptor,
    pub properties: MediaProperties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
}
