//! SQLite database operations (the Local Store)
//!
//! All on-device persistence goes through this module:
//! - `posts` and `diary` collections, keyed by entity id
//! - `kv`, a flat key-value area holding `profile` and `cloud-config`
//!
//! Reads return every row in insertion order. Ordering by date is the
//! caller's job.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use super::timestamp;
use crate::error::AppError;

/// Key of the profile slot in the key-value area
pub const PROFILE_KEY: &str = "profile";
/// Key of the cloud configuration slot in the key-value area
pub const CLOUD_CONFIG_KEY: &str = "cloud-config";

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    description: String,
    date: String,
    preview_url: String,
    image_data: Option<Vec<u8>>,
    mime_type: Option<String>,
    image_url: Option<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            date: timestamp::local::decode(&row.date)?,
            id: row.id,
            image: PostImage {
                preview_url: row.preview_url,
                data: row.image_data,
                mime_type: row.mime_type,
            },
            description: row.description,
            image_url: row.image_url,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DiaryRow {
    id: String,
    title: String,
    content: String,
    date: String,
    updated_at: String,
}

impl TryFrom<DiaryRow> for DiaryEntry {
    type Error = AppError;

    fn try_from(row: DiaryRow) -> Result<Self, Self::Error> {
        Ok(DiaryEntry {
            date: timestamp::local::decode(&row.date)?,
            updated_at: timestamp::local::decode(&row.updated_at)?,
            id: row.id,
            title: row.title,
            content: row.content,
        })
    }
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically. Migrations only ever add
    /// tables, so opening an older file keeps its rows.
    ///
    /// # Errors
    /// `EngineUnavailable` if the file cannot be created or opened,
    /// `Internal` if a migration fails.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::EngineUnavailable(format!(
                    "cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string)
            .await
            .map_err(|e| {
                AppError::EngineUnavailable(format!(
                    "cannot open database {}: {}",
                    path.display(),
                    e
                ))
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Highest applied schema version
    pub async fn schema_version(&self) -> Result<i64, AppError> {
        let version = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(version), 0) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(version)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert or replace a post by id
    pub async fn upsert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, description, date, preview_url, image_data, mime_type, image_url
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                description = excluded.description,
                date = excluded.date,
                preview_url = excluded.preview_url,
                image_data = excluded.image_data,
                mime_type = excluded.mime_type,
                image_url = excluded.image_url
            "#,
        )
        .bind(&post.id)
        .bind(&post.description)
        .bind(timestamp::local::encode(&post.date))
        .bind(&post.image.preview_url)
        .bind(&post.image.data)
        .bind(&post.image.mime_type)
        .bind(&post.image_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get every post, in insertion order
    pub async fn get_all_posts(&self) -> Result<Vec<Post>, AppError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, description, CAST(date AS TEXT) AS date, preview_url,
                   image_data, mime_type, image_url
            FROM posts
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Post::try_from).collect()
    }

    // =========================================================================
    // Diary
    // =========================================================================

    /// Insert a diary entry, or update title/content/updated_at of an
    /// existing one. The stored creation date is never rewritten.
    pub async fn upsert_diary_entry(&self, entry: &DiaryEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO diary (id, title, content, date, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(timestamp::local::encode(&entry.date))
        .bind(timestamp::local::encode(&entry.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get every diary entry, in insertion order
    pub async fn get_all_diary_entries(&self) -> Result<Vec<DiaryEntry>, AppError> {
        let rows = sqlx::query_as::<_, DiaryRow>(
            r#"
            SELECT id, title, content, CAST(date AS TEXT) AS date,
                   CAST(updated_at AS TEXT) AS updated_at
            FROM diary
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DiaryEntry::try_from).collect()
    }

    /// Delete a diary entry
    ///
    /// # Returns
    /// `true` if a row was removed
    pub async fn remove_diary_entry(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM diary WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Key-value area
    // =========================================================================

    /// Get raw value
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Set raw value
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a key, returning whether it existed
    pub async fn delete_value(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, AppError> {
        match self.get_value(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.set_value(key, &raw).await
    }

    /// Get the stored profile
    pub async fn get_profile(&self) -> Result<Option<UserProfile>, AppError> {
        self.get_json(PROFILE_KEY).await
    }

    /// Overwrite the stored profile
    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.set_json(PROFILE_KEY, profile).await
    }

    /// Get the stored cloud configuration
    pub async fn get_cloud_config(&self) -> Result<Option<CloudConfig>, AppError> {
        self.get_json(CLOUD_CONFIG_KEY).await
    }

    /// Overwrite the stored cloud configuration
    pub async fn save_cloud_config(&self, config: &CloudConfig) -> Result<(), AppError> {
        self.set_json(CLOUD_CONFIG_KEY, config).await
    }

    /// Remove the stored cloud configuration
    pub async fn delete_cloud_config(&self) -> Result<bool, AppError> {
        self.delete_value(CLOUD_CONFIG_KEY).await
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
