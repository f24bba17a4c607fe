//! Task model: units of work living in a column.
//!
//! A task's stored `order` is only a client-supplied position hint. Listing
//! uses the display order instead: favorites first, then name ascending with
//! ordinal (byte-wise, case-sensitive) comparison.

mod queries;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::task_image::TaskImage;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub column_id: Uuid, // Foreign key to Column
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    /// Position hint within the column. Duplicates and gaps are allowed.
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task joined with the name of its column and its images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithImages {
    #[serde(flatten)]
    pub task: Task,
    pub column_name: String,
    pub images: Vec<TaskImage>,
}

impl std::ops::Deref for TaskWithImages {
    type Target = Task;
    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TaskWithColumnName {
    #[sqlx(flatten)]
    pub task: Task,
    pub column_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub column_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl CreateTask {
    pub fn new(column_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            column_id,
            name: name.into(),
            description: None,
            deadline: None,
        }
    }
}

/// Partial update: only the fields that are present are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub column_id: Option<Uuid>,
    pub is_favorite: Option<bool>,
}

impl UpdateTask {
    /// Apply the present fields onto `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline);
        }
        if let Some(column_id) = self.column_id {
            task.column_id = column_id;
        }
        if let Some(is_favorite) = self.is_favorite {
            task.is_favorite = is_favorite;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveTask {
    pub new_column_id: Uuid,
    pub new_order: i64,
}

/// Attach each task's images, keeping the task order of `rows`.
fn attach_images(rows: Vec<TaskWithColumnName>, images: Vec<TaskImage>) -> Vec<TaskWithImages> {
    let mut by_task: HashMap<Uuid, Vec<TaskImage>> = HashMap::new();
    for image in images {
        by_task.entry(image.task_id).or_default().push(image);
    }

    rows.into_iter()
        .map(|row| {
            let images = by_task.remove(&row.task.id).unwrap_or_default();
            TaskWithImages {
                task: row.task,
                column_name: row.column_name,
                images,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, is_favorite: bool) -> Task {
        Task {
            id: Uuid::new_v4(),
            column_id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some("keep me".to_string()),
            deadline: None,
            is_favorite,
            order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut t = task("Old", false);
        let original = t.clone();

        UpdateTask {
            name: Some("New".to_string()),
            ..Default::default()
        }
        .apply_to(&mut t);

        assert_eq!(t.name, "New");
        assert_eq!(t.description, original.description);
        assert_eq!(t.deadline, original.deadline);
        assert_eq!(t.column_id, original.column_id);
        assert_eq!(t.is_favorite, original.is_favorite);
    }

    #[test]
    fn test_attach_images_groups_by_task() {
        let first = task("first", false);
        let second = task("second", false);
        let image = TaskImage {
            id: Uuid::new_v4(),
            task_id: second.id,
            image_url: "https://localhost/images/x.png".to_string(),
            blob_name: "x.png".to_string(),
            file_name: "x.png".to_string(),
            content_type: "image/png".to_string(),
            uploaded_at: Utc::now(),
        };

        let rows = vec![
            TaskWithColumnName {
                task: first.clone(),
                column_name: "Todo".to_string(),
            },
            TaskWithColumnName {
                task: second.clone(),
                column_name: "Todo".to_string(),
            },
        ];

        let joined = attach_images(rows, vec![image]);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].id, first.id);
        assert!(joined[0].images.is_empty());
        assert_eq!(joined[1].images.len(), 1);
    }
}
