//! Comment repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    comment::{Comment, CommentAuthor, CommentResponse},
    user::UserSummary,
};

/// Comment repository
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Create a new comment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write a comment under a video
    pub async fn create(&self, user_id: Uuid, video_id: Uuid, text: &str) -> Result<Comment> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (id, text, video_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, video_id, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(text)
        .bind(video_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment {
            id: row.get("id"),
            text: row.get("text"),
            video_id: row.get("video_id"),
            user_id: row.get("user_id"),
            created_at: row.get("created_at"),
        })
    }

    /// Comments under a video, newest first, with author summaries
    pub async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<CommentResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.text, c.created_at,
                   u.id AS author_id, u.username, u.first_name, u.last_name, u.profile_img
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.video_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let profile_img: Option<serde_json::Value> = row.get("profile_img");
            comments.push(CommentResponse {
                id: row.get("id"),
                text: row.get("text"),
                created_at: row.get("created_at"),
                user: CommentAuthor {
                    id: row.get("author_id"),
                    summary: UserSummary {
                        username: row.get("username"),
                        first_name: row.get("first_name"),
                        last_name: row.get("last_name"),
                        profile_img: profile_img.map(serde_json::from_value).transpose()?,
                    },
                },
            });
        }
        Ok(comments)
    }

    /// Author of a comment, if the comment exists
    pub async fn owner_id(&self, comment_id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    /// Delete a comment; returns whether a row was removed
    pub async fn delete(&self, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
