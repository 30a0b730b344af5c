//! Comment model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Comment entity
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request body for writing a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Comment with its author summary, as listed under a video
#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub text: String,
    pub user: CommentAuthor,
    pub created_at: DateTime<Utc>,
}

/// Author of a comment
#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    pub id: Uuid,
    #[serde(flatten)]
    pub summary: UserSummary,
}
