//! Tag repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::tag::Tag;

/// Tag repository
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    /// Create a new tag repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a tag
    pub async fn create(&self, title: &str) -> Result<Tag> {
        let row = sqlx::query(
            "INSERT INTO tags (id, title) VALUES ($1, $2) RETURNING id, title",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(Tag {
            id: row.get("id"),
            title: row.get("title"),
        })
    }

    /// Check whether a tag with this title exists
    pub async fn exists_by_title(&self, title: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tags WHERE title = $1)")
            .bind(title)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Every tag
    pub async fn get_all(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, title FROM tags ORDER BY title")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                title: row.get("title"),
            })
            .collect())
    }

    /// Find a tag by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, title FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Tag {
            id: row.get("id"),
            title: row.get("title"),
        }))
    }

    /// Resolve the subset of the given ids that exist
    pub async fn find_existing(&self, ids: &[Uuid]) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT id, title FROM tags WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                title: row.get("title"),
            })
            .collect())
    }

    /// Rename a tag
    pub async fn update(&self, id: Uuid, title: &str) -> Result<()> {
        sqlx::query("UPDATE tags SET title = $2 WHERE id = $1")
            .bind(id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a tag and its video links in one transaction
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM video_tags WHERE tag_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
