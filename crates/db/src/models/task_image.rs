//! Image metadata attached to a task. The bytes themselves live in blob
//! storage under `blob_name`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TaskImage {
    pub id: Uuid,
    pub task_id: Uuid,
    pub image_url: String,
    pub blob_name: String,
    pub file_name: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTaskImage {
    pub task_id: Uuid,
    pub image_url: String,
    pub blob_name: String,
    pub file_name: String,
    pub content_type: String,
}

const COLUMNS: &str =
    "i.id, i.task_id, i.image_url, i.blob_name, i.file_name, i.content_type, i.uploaded_at";

impl TaskImage {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTaskImage,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskImage>(
            r#"INSERT INTO task_images (id, task_id, image_url, blob_name, file_name, content_type, uploaded_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, task_id, image_url, blob_name, file_name, content_type, uploaded_at"#,
        )
        .bind(id)
        .bind(data.task_id)
        .bind(&data.image_url)
        .bind(&data.blob_name)
        .bind(&data.file_name)
        .bind(&data.content_type)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskImage>(&format!(
            "SELECT {COLUMNS} FROM task_images i WHERE i.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Images of a task, oldest upload first.
    pub async fn find_by_task_id(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskImage>(&format!(
            "SELECT {COLUMNS} FROM task_images i WHERE i.task_id = $1 ORDER BY i.uploaded_at ASC, i.rowid ASC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_column_id(
        pool: &SqlitePool,
        column_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskImage>(&format!(
            r#"SELECT {COLUMNS}
               FROM task_images i
               JOIN tasks t ON t.id = i.task_id
               WHERE t.column_id = $1
               ORDER BY i.uploaded_at ASC, i.rowid ASC"#
        ))
        .bind(column_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskImage>(&format!(
            "SELECT {COLUMNS} FROM task_images i ORDER BY i.uploaded_at ASC, i.rowid ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
