//! Short repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    short::{NewShort, Short, ShortResponse},
    user::UserSummary,
};

const SHORT_COLUMNS: &str =
    "id, title, description, views, src, thumbnail, properties, user_id, created_at, updated_at";

fn map_short(row: &PgRow) -> Result<Short> {
    let src: serde_json::Value = row.get("src");
    let thumbnail: serde_json::Value = row.get("thumbnail");
    let properties: serde_json::Value = row.get("properties");

    Ok(Short {
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

fn to_response(short: Short, user: UserSummary) -> ShortResponse {
    ShortResponse {
        id: short.id,
        title: short.title,
        description: short.description,
        views: short.views,
        src: short.src,
        thumbnail: short.thumbnail,
        properties: short.properties,
        created_at: short.created_at,
        updated_at: short.updated_at,
        user,
    }
}

/// Short repository
#[derive(Clone)]
pub struct ShortRepository {
    pool: PgPool,
}

impl ShortRepository {
    /// Create a new short repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a short
    pub async fn create(&self, new_short: &NewShort) -> Result<Short> {
        info!("Creating short {:?}", new_short.title);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO shorts (id, title, description, views, src, thumbnail, properties, user_id)
            VALUES ($1, $2, $3, 0, $4, $5, $6, $7)
            RETURNING {SHORT_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(&new_short.title)
        .bind(&new_short.description)
        .bind(serde_json::to_value(&new_short.src)?)
        .bind(serde_json::to_value(&new_short.thumbnail)?)
        .bind(serde_json::to_value(new_short.properties)?)
        .bind(new_short.user_id)
        .fetch_one(&self.pool)
        .await?;

        map_short(&row)
    }

    /// Every short with its owner summary
    pub async fn get_all(&self) -> Result<Vec<ShortResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.title, s.description, s.views, s.src, s.thumbnail, s.properties,
                   s.user_id, s.created_at, s.updated_at,
                   u.username, u.first_name, u.last_name, u.profile_img
            FROM shorts s
            JOIN users u ON u.id = s.user_id
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut shorts = Vec::with_capacity(rows.len());
        for row in &rows {
            shorts.push(to_response(map_short(row)?, map_user_summary(row)?));
        }
        Ok(shorts)
    }

    /// Fetch a short detail, atomically incrementing its view counter
    pub async fn view(&self, id: Uuid) -> Result<Option<ShortResponse>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE shorts
            SET views = views + 1, updated_at = now()
            WHERE id = $1
            RETURNING {SHORT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let short = map_short(&row)?;

        let user_row = sqlx::query(
            "SELECT username, first_name, last_name, profile_img FROM users WHERE id = $1",
        )
        .bind(short.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(to_response(short, map_user_summary(&user_row)?)))
    }

    /// Fetch a short row without touching the view counter
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Short>> {
        let row = sqlx::query(&format!("SELECT {SHORT_COLUMNS} FROM shorts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_short).transpose()
    }

    /// Owning user of a short, if the short exists
    pub async fn owner_id(&self, id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM shorts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    /// Delete a short row
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        info!("Deleting short {}", id);

        sqlx::query("DELETE FROM shorts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
