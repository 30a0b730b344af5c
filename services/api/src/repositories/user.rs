//! User repository for database operations

use anyhow::Result;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    FileDescriptor, ProfileImage,
    user::{NewUser, UpdateUser, User},
};

const USER_COLUMNS: &str =
    "id, email, username, password_hash, cover, profile_img, first_name, last_name, created_at, updated_at";

fn map_user(row: &PgRow) -> Result<User> {
    let profile_img: Option<serde_json::Value> = row.get("profile_img");
    let profile_img = profile_img.map(serde_json::from_value).transpose()?;

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        cover: row.get("cover"),
        profile_img,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing the password on the way in
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        let profile_img = new_user
            .profile_img
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, email, username, password_hash, cover, profile_img, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind("none")
        .bind(profile_img)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(&self.pool)
        .await?;

        map_user(&row)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Check whether an email is already registered
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Apply a partial profile update
    pub async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                cover = COALESCE($4, cover),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .bind(update.cover.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Replace the user's profile image descriptor
    pub async fn set_profile_image(&self, id: Uuid, image: &ProfileImage) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET profile_img = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(serde_json::to_value(image)?)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Collect the blob descriptors of everything the user owns
    /// (video and short sources plus thumbnails), for storage cleanup
    /// ahead of account deletion.
    pub async fn media_descriptors(&self, id: Uuid) -> Result<Vec<FileDescriptor>> {
        let rows = sqlx::query(
            r#"
            SELECT src, thumbnail FROM videos WHERE user_id = $1
            UNION ALL
            SELECT src, thumbnail FROM shorts WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut descriptors = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            let src: serde_json::Value = row.get("src");
            let thumbnail: serde_json::Value = row.get("thumbnail");
            descriptors.push(serde_json::from_value(src)?);
            descriptors.push(serde_json::from_value(thumbnail)?);
        }
        Ok(descriptors)
    }

    /// Delete a user and everything they own.
    ///
    /// Explicit cascade, children first: the user's comments and reactions,
    /// then comments/reactions/tag-links on the user's videos, then the
    /// videos and shorts themselves, finally the user row. One transaction;
    /// any failure rolls the whole sequence back.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        info!("Deleting user {} and owned content", id);

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_liked_videos WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_disliked_videos WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM comments WHERE video_id IN (SELECT id FROM videos WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM user_liked_videos WHERE video_id IN (SELECT id FROM videos WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM user_disliked_videos WHERE video_id IN (SELECT id FROM videos WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM video_tags WHERE video_id IN (SELECT id FROM videos WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM videos WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shorts WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
