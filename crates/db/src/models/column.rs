use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::task::{Task, TaskWithImages};

/// A named lane on the board.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub name: String,
    /// Position among columns, assigned as `max + 1` at creation and never
    /// rewritten afterwards.
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateColumn {
    pub name: String,
}

/// A column together with its tasks (display order) and their images.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnWithTasks {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<TaskWithImages>,
}

impl std::ops::Deref for ColumnWithTasks {
    type Target = Column;
    fn deref(&self) -> &Self::Target {
        &self.column
    }
}

impl Column {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"SELECT id, name, "order", created_at, updated_at
               FROM columns
               ORDER BY "order" ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(
            r#"SELECT id, name, "order", created_at, updated_at
               FROM columns
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM columns WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }

    /// Create a column at the end of the board.
    ///
    /// The order is computed inside the INSERT so concurrent creates cannot
    /// observe the same maximum; the unique index on `order` backs this up.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateColumn,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let column = sqlx::query_as::<_, Column>(
            r#"INSERT INTO columns (id, name, "order", created_at, updated_at)
               SELECT $1, $2, COALESCE(MAX("order"), 0) + 1, $3, $3 FROM columns
               RETURNING id, name, "order", created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(now)
        .fetch_one(pool)
        .await?;

        tracing::debug!(column_id = %column.id, order = column.order, "Created column");
        Ok(column)
    }

    /// Delete a column. Its tasks and their image rows go with it through the
    /// foreign-key cascade. Not exposed over HTTP.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM columns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_with_tasks(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<ColumnWithTasks>, sqlx::Error> {
        let Some(column) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let tasks = Task::find_by_column_id_with_images(pool, id).await?;
        Ok(Some(ColumnWithTasks { column, tasks }))
    }

    /// All columns in board order, each with its tasks and images.
    pub async fn find_all_with_tasks(
        pool: &SqlitePool,
    ) -> Result<Vec<ColumnWithTasks>, sqlx::Error> {
        let columns = Self::find_all(pool).await?;
        let tasks = Task::find_all_with_images(pool).await?;

        let mut by_column: HashMap<Uuid, Vec<TaskWithImages>> = HashMap::new();
        for task in tasks {
            by_column.entry(task.column_id).or_default().push(task);
        }

        Ok(columns
            .into_iter()
            .map(|column| {
                let tasks = by_column.remove(&column.id).unwrap_or_default();
                ColumnWithTasks { column, tasks }
            })
            .collect())
    }
}
