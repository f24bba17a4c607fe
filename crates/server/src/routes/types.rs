//! Wire representations of board records.
//!
//! These are flat views: a task carries its column's name instead of a
//! reference to the column, and image storage details stay server-side.

use chrono::{DateTime, Utc};
use db::models::{column::ColumnWithTasks, task::TaskWithImages, task_image::TaskImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDto {
    pub id: Uuid,
    pub name: String,
    pub order: i64,
    pub tasks: Vec<TaskDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub column_id: Uuid,
    pub column_name: String,
    pub is_favorite: bool,
    pub order: i64,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub images: Vec<ImageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageDto {
    pub id: Uuid,
    pub image_url: String,
    pub file_name: String,
    pub uploaded_date: DateTime<Utc>,
}

impl From<TaskImage> for ImageDto {
    fn from(image: TaskImage) -> Self {
        Self {
            id: image.id,
            image_url: image.image_url,
            file_name: image.file_name,
            uploaded_date: image.uploaded_at,
        }
    }
}

impl From<TaskWithImages> for TaskDto {
    fn from(value: TaskWithImages) -> Self {
        let TaskWithImages {
            task,
            column_name,
            images,
        } = value;
        Self {
            id: task.id,
            name: task.name,
            description: task.description,
            deadline: task.deadline,
            column_id: task.column_id,
            column_name,
            is_favorite: task.is_favorite,
            order: task.order,
            created_date: task.created_at,
            modified_date: task.updated_at,
            images: images.into_iter().map(ImageDto::from).collect(),
        }
    }
}

impl From<ColumnWithTasks> for ColumnDto {
    fn from(value: ColumnWithTasks) -> Self {
        Self {
            id: value.column.id,
            name: value.column.name,
            order: value.column.order,
            tasks: value.tasks.into_iter().map(TaskDto::from).collect(),
        }
    }
}
