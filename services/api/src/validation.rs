//! Input validation utilities

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// File extensions accepted for image uploads (profile images, thumbnails)
pub const IMAGE_FILE_TYPES: &[&str] = &[".png", ".jpeg", ".jpg", ".webp"];

/// File extensions accepted for video uploads
pub const VIDEO_FILE_TYPES: &[&str] = &[".mp4", ".mov", ".avi", ".webm", ".mkv"];

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 80 {
        return Err("Email must be at most 80 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate a display name (first or last name)
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if name.len() > 40 {
        return Err("Name must be at most 40 characters long".to_string());
    }
    Ok(())
}

/// Validate a video or short title
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.len() < 10 {
        return Err("Title must be at least 10 characters long".to_string());
    }
    if title.len() > 80 {
        return Err("Title must be at most 80 characters long".to_string());
    }
    Ok(())
}

/// Validate a video or short description
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.len() < 10 {
        return Err("Description must be at least 10 characters long".to_string());
    }
    if description.len() > 255 {
        return Err("Description must be at most 255 characters long".to_string());
    }
    Ok(())
}

/// Validate a tag title
pub fn validate_tag_title(title: &str) -> Result<(), String> {
    if title.len() < 3 {
        return Err("Tag title must be at least 3 characters long".to_string());
    }
    if title.len() > 20 {
        return Err("Tag title must be at most 20 characters long".to_string());
    }
    Ok(())
}

/// Validate a comment body
pub fn validate_comment_text(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("Comment text is required".to_string());
    }
    if text.len() > 256 {
        return Err("Comment must be at most 256 characters long".to_string());
    }
    Ok(())
}

/// Extract the extension of an uploaded file name, dot included, lowercased.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// Check an uploaded file name against an extension allow-list.
///
/// Returns the extension on success so callers can reuse it when naming
/// the stored object.
pub fn validate_file_type(file_name: &str, allowed: &[&str]) -> Result<String, String> {
    let Some(ext) = file_extension(file_name) else {
        return Err(format!("File {} has no extension", file_name));
    };
    if !allowed.contains(&ext.as_str()) {
        return Err(format!("Unsupported file type {}", ext.trim_start_matches('.')));
    }
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("dash-ed").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
        assert!(validate_email(&format!("{}@example.com", "x".repeat(90))).is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(200)).is_err());
    }

    #[test]
    fn title_and_description_lengths() {
        assert!(validate_title("A ten char title").is_ok());
        assert!(validate_title("too short").is_err());
        assert!(validate_description("long enough description").is_ok());
        assert!(validate_description("tiny").is_err());
    }

    #[test]
    fn tag_and_comment_lengths() {
        assert!(validate_tag_title("rust").is_ok());
        assert!(validate_tag_title("ab").is_err());
        assert!(validate_tag_title(&"t".repeat(30)).is_err());
        assert!(validate_comment_text("nice video").is_ok());
        assert!(validate_comment_text("").is_err());
    }

    #[test]
    fn file_type_allow_list() {
        assert_eq!(
            validate_file_type("clip.MP4", VIDEO_FILE_TYPES).unwrap(),
            ".mp4"
        );
        assert_eq!(
            validate_file_type("pic.webp", IMAGE_FILE_TYPES).unwrap(),
            ".webp"
        );
        assert!(validate_file_type("malware.exe", VIDEO_FILE_TYPES).is_err());
        assert!(validate_file_type("noext", IMAGE_FILE_TYPES).is_err());
    }
}
