//! Video model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FileDescriptor, user::UserSummary};
use crate::models::tag::Tag;

/// Intrinsic properties of an uploaded media file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MediaProperties {
    pub duration: f64,
    pub height: i32,
    pub width: i32,
}

/// Video entity
#[derive(Debug, Clone, Serialize)]
pub struct Video {
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

/// New video payload, assembled by the upload workflow
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub src: FileDescriptor,
    pub thumbnail: FileDescriptor,
    pub properties: MediaProperties,
    pub user_id: Uuid,
    pub tag_ids: Vec<Uuid>,
}

/// Full video detail returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub views: i32,
    pub src: FileDescriptor,
    pub thumbnail: FileDescriptor,
    pub properties: MediaProperties,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
}

/// Reaction counts for a video plus the caller's own membership
#[derive(Debug, Clone, Serialize)]
pub struct ReactionSummary {
    pub liked_users_count: i64,
    pub disliked_users_count: i64,
    pub user_has_liked: bool,
    pub user_has_disliked: bool,
}
