use anyhow::Result;
use aws_config::BehaviorVersion;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod mail;
mod media_probe;
mod middleware;
mod models;
mod registration;
mod repositories;
mod routes;
mod state;
mod storage;
mod validation;

use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, init_pool};

use crate::{
    jwt::{JwtConfig, JwtService},
    mail::{Mailer, MailerConfig},
    registration::RegistrationService,
    repositories::{
        CommentRepository, ReactionRepository, ShortRepository, TagRepository, UserRepository,
        VideoRepository,
    },
    state::{ApiConfig, AppState},
    storage::{ObjectStorage, StorageConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Clipstream API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply schema migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(common::error::DatabaseError::from)?;
    info!("Database migrations applied");

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Initialize blob storage
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&sdk_config);
    let storage = ObjectStorage::new(s3_client, StorageConfig::from_env()?);

    // Initialize mailer and registration workflow
    let mailer = Mailer::new(MailerConfig::from_env()?);
    let confirm_base_url = std::env::var("CONFIRM_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let registration = RegistrationService::new(redis_pool.clone(), mailer, confirm_base_url);

    // Initialize repositories
    let user_repository = UserRepository::new(pool.clone());
    let video_repository = VideoRepository::new(pool.clone());
    let short_repository = ShortRepository::new(pool.clone());
    let comment_repository = CommentRepository::new(pool.clone());
    let tag_repository = TagRepository::new(pool.clone());
    let reaction_repository = ReactionRepository::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        redis_pool,
        jwt_service,
        storage,
        registration,
        user_repository,
        video_repository,
        short_repository,
        comment_repository,
        tag_repository,
        reaction_repository,
        config: ApiConfig::from_env(),
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("API service listening on 0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
