//! Application state shared across handlers

use common::cache::RedisPool;
use sqlx::PgPool;

use crate::{
    jwt::JwtService,
    registration::RegistrationService,
    repositories::{
        CommentRepository, ReactionRepository, ShortRepository, TagRepository, UserRepository,
        VideoRepository,
    },
    storage::ObjectStorage,
};

/// HTTP-surface configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Mark session cookies `Secure`
    pub cookie_secure: bool,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `COOKIE_SECURE`: "true" to mark session cookies Secure (default: false)
    pub fn from_env() -> Self {
        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "True")
            .unwrap_or(false);

        ApiConfig { cookie_secure }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub storage: ObjectStorage,
    pub registration: RegistrationService,
    pub user_repository: UserRepository,
    pub video_repository: VideoRepository,
    pub short_repository: ShortRepository,
    pub comment_repository: CommentRepository,
    pub tag_repository: TagRepository,
    pub reaction_repository: ReactionRepository,
    pub config: ApiConfig,
}
