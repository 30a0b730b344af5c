//! Domain models and API payloads

use serde::{Deserialize, Serialize};

pub mod comment;
pub mod short;
pub mod tag;
pub mod user;
pub mod video;

/// Descriptor of a blob held in external storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileDescriptor {
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub url: String,
}

impl From<crate::storage::StoredFile> for FileDescriptor {
    fn from(stored: crate::storage::StoredFile) -> Self {
        Self {
            file_id: stored.file_id,
            url: stored.url,
        }
    }
}

/// Descriptor of a user's profile image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileImage {
    #[serde(rename = "fileId")]
    pub file_id: String,
    pub url: String,
    pub is_default: bool,
}

impl ProfileImage {
    /// The placeholder image users fall back to
    pub fn default_image() -> Self {
        Self {
            file_id: "default_file_id".to_string(),
            url: "default_img_url".to_string(),
            is_default: true,
        }
    }

    /// Wrap a freshly uploaded blob as a non-default profile image
    pub fn uploaded(stored: crate::storage::StoredFile) -> Self {
        Self {
            file_id: stored.file_id,
            url: stored.url,
            is_default: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_descriptor_uses_camel_case_file_id() {
        let descriptor = FileDescriptor {
            file_id: "contents/abc.mp4".to_string(),
            url: "https://cdn.example.com/contents/abc.mp4".to_string(),
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["fileId"], "contents/abc.mp4");

        let back: FileDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, descriptor);
    }

    #[test]
    fn default_profile_image_is_flagged() {
        let img = ProfileImage::default_image();
        assert!(img.is_default);
    }
}
