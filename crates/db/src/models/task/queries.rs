//! CRUD, move and favorite operations for tasks.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{CreateTask, Task, TaskWithColumnName, TaskWithImages, UpdateTask, attach_images};
use crate::models::task_image::TaskImage;

const SELECT_WITH_COLUMN_NAME: &str = r#"SELECT
    t.id,
    t.column_id,
    t.name,
    t.description,
    t.deadline,
    t.is_favorite,
    t."order",
    t.created_at,
    t.updated_at,
    c.name AS column_name
FROM tasks t
JOIN columns c ON c.id = t.column_id"#;

impl Task {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT id, column_id, name, description, deadline, is_favorite, "order",
                      created_at, updated_at
               FROM tasks
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Fetch a task with its column name and images (ascending upload time).
    pub async fn find_with_images(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<TaskWithImages>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskWithColumnName>(&format!(
            "{SELECT_WITH_COLUMN_NAME} WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let images = TaskImage::find_by_task_id(pool, id).await?;
        Ok(attach_images(vec![row], images).pop())
    }

    /// All tasks in display order: favorites first, then name ascending.
    pub async fn find_all_with_images(
        pool: &SqlitePool,
    ) -> Result<Vec<TaskWithImages>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskWithColumnName>(&format!(
            "{SELECT_WITH_COLUMN_NAME} ORDER BY t.is_favorite DESC, t.name ASC"
        ))
        .fetch_all(pool)
        .await?;
        let images = TaskImage::find_all(pool).await?;
        Ok(attach_images(rows, images))
    }

    /// Tasks of one column in display order.
    pub async fn find_by_column_id_with_images(
        pool: &SqlitePool,
        column_id: Uuid,
    ) -> Result<Vec<TaskWithImages>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskWithColumnName>(&format!(
            "{SELECT_WITH_COLUMN_NAME} WHERE t.column_id = $1 ORDER BY t.is_favorite DESC, t.name ASC"
        ))
        .bind(column_id)
        .fetch_all(pool)
        .await?;
        let images = TaskImage::find_by_column_id(pool, column_id).await?;
        Ok(attach_images(rows, images))
    }

    /// Insert a task with `order = 0`.
    ///
    /// The column reference is not re-validated here; callers check it first.
    /// Returns the task re-fetched with its column name and images.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTask,
        id: Uuid,
    ) -> Result<TaskWithImages, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO tasks (id, column_id, name, description, deadline, is_favorite, "order",
                                  created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, FALSE, 0, $6, $6)"#,
        )
        .bind(id)
        .bind(data.column_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.deadline)
        .bind(now)
        .execute(pool)
        .await?;

        tracing::debug!(task_id = %id, column_id = %data.column_id, "Created task");

        Self::find_with_images(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Apply a partial update and stamp `updated_at`.
    ///
    /// Returns `RowNotFound` if the task does not exist.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<TaskWithImages, sqlx::Error> {
        let mut task = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        data.apply_to(&mut task);

        sqlx::query(
            r#"UPDATE tasks
               SET name = $2, description = $3, deadline = $4, column_id = $5,
                   is_favorite = $6, updated_at = $7
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.deadline)
        .bind(task.column_id)
        .bind(task.is_favorite)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::find_with_images(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Delete a task; its image rows go with it through the cascade.
    /// Returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the column and order of a task unconditionally.
    ///
    /// Siblings are not resequenced. The target column is not validated here.
    /// Returns `false` (and changes nothing) when the task does not exist.
    pub async fn move_to(
        pool: &SqlitePool,
        id: Uuid,
        new_column_id: Uuid,
        new_order: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE tasks
               SET column_id = $2, "order" = $3, updated_at = $4
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(new_column_id)
        .bind(new_order)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        let moved = result.rows_affected() > 0;
        if moved {
            tracing::debug!(task_id = %id, column_id = %new_column_id, order = new_order, "Moved task");
        }
        Ok(moved)
    }

    /// Flip the favorite flag in a single statement.
    ///
    /// Returns `RowNotFound` if the task does not exist.
    pub async fn toggle_favorite(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<TaskWithImages, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE tasks
               SET is_favorite = NOT is_favorite, updated_at = $2
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Self::find_with_images(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
