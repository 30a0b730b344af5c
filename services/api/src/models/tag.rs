//! Tag model and related payloads

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
}

/// Request body for creating or renaming a tag
#[derive(Debug, Clone, Deserialize)]
pub struct TagRequest {
    pub title: String,
}
