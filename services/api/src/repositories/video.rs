//! Video repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    tag::Tag,
    user::UserSummary,
    video::{NewVideo, Video, VideoResponse},
};

const VIDEO_COLUMNS: &str =
    "id, title, description, views, src, thumbnail, properties, user_id, created_at, updated_at";

fn map_video(row: &PgRow) -> Result<Video> {
    let src: serde_json::Value = row.get("src");
    let thumbnail: serde_json::Value = row.get("thumbnail");
    let properties: serde_json::Value = row.get("properties");

    Ok(Video {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        views: row.get("views"),
        src: serde_json::from_value(src)?,
        thumbnail: serde_json::from_value(thumbnail)?,
        properties: serde_json::from_value(properties)?,
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_user_summary(row: &PgRow) -> Result<UserSummary> {
    let profile_img: Option<serde_json::Value> = row.get("profile_img");
    Ok(UserSummary {
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        profile_img: profile_img.map(serde_json::from_value).transpose()?,
    })
}

/// Video repository
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    /// Create a new video repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a video and its tag links in one transaction
    pub async fn create(&self, new_video: &NewVideo) -> Result<Video> {
        info!("Creating video {:?}", new_video.title);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO videos (id, title, description, views, src, thumbnail, properties, user_id)
            VALUES ($1, $2, $3, 0, $4, $5, $6, $7)
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(serde_json::to_value(&new_video.src)?)
        .bind(serde_json::to_value(&new_video.thumbnail)?)
        .bind(serde_json::to_value(new_video.properties)?)
        .bind(new_video.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let video = map_video(&row)?;

        for tag_id in &new_video.tag_ids {
            sqlx::query("INSERT INTO video_tags (video_id, tag_id) VALUES ($1, $2)")
                .bind(video.id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(video)
    }

    /// Every video with its owner summary and tags
    pub async fn get_all(&self) -> Result<Vec<VideoResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id, v.title, v.description, v.views, v.src, v.thumbnail, v.properties,
                   v.user_id, v.created_at, v.updated_at,
                   u.username, u.first_name, u.last_name, u.profile_img
            FROM videos v
            JOIN users u ON u.id = v.user_id
            ORDER BY v.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut videos = Vec::with_capacity(rows.len());
        for row in &rows {
            videos.push((map_video(row)?, map_user_summary(row)?));
        }

        let ids: Vec<Uuid> = videos.iter().map(|(v, _)| v.id).collect();
        let mut tags = self.tags_for(&ids).await?;

        Ok(videos
            .into_iter()
            .map(|(video, user)| {
                let tags = tags.remove(&video.id).unwrap_or_default();
                to_response(video, user, tags)
            })
            .collect())
    }

    /// Fetch a video detail, atomically incrementing its view counter.
    ///
    /// Every read of a single video is a write: the counter moves by
    /// exactly 1 per call, in the same statement that reads the row.
    pub async fn view(&self, id: Uuid) -> Result<Option<VideoResponse>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE videos
            SET views = views + 1, updated_at = now()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let video = map_video(&row)?;

        let user_row = sqlx::query(
            "SELECT username, first_name, last_name, profile_img FROM users WHERE id = $1",
        )
        .bind(video.user_id)
        .fetch_one(&self.pool)
        .await?;
        let user = map_user_summary(&user_row)?;

        let tags = self
            .tags_for(&[video.id])
            .await?
            .remove(&video.id)
            .unwrap_or_default();

        Ok(Some(to_response(video, user, tags)))
    }

    /// Fetch a video row without touching the view counter
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        let row = sqlx::query(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_video).transpose()
    }

    /// Check whether a video exists
    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Owning user of a video, if the video exists
    pub async fn owner_id(&self, id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    /// Delete a video and its children in one transaction.
    ///
    /// Cascade order: tag links, comments, reactions, then the row.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        info!("Deleting video {}", id);

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM video_tags WHERE video_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE video_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_liked_videos WHERE video_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_disliked_videos WHERE video_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn tags_for(&self, video_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Tag>>> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT vt.video_id, t.id, t.title
            FROM video_tags vt
            JOIN tags t ON t.id = vt.tag_id
            WHERE vt.video_id = ANY($1)
            "#,
        )
        .bind(video_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            let video_id: Uuid = row.get("video_id");
            tags.entry(video_id).or_default().push(Tag {
                id: row.get("id"),
                title: row.get("title"),
            });
        }
        Ok(tags)
    }
}

fn to_response(video: Video, user: UserSummary, tags: Vec<Tag>) -> VideoResponse {
    VideoResponse {
        id: video.id,
        title: video.title,
        description: video.description,
        views: video.views,
        src: video.src,
        thumbnail: video.thumbnail,
        properties: video.properties,
        tags,
        created_at: video.created_at,
        updated_at: video.updated_at,
        user,
    }
}
