//! Integration tests for board ordering, move semantics and cascades.

use db::{
    models::{
        column::{Column, CreateColumn},
        task::{CreateTask, Task, UpdateTask},
        task_image::{CreateTaskImage, TaskImage},
    },
    test_utils::create_test_pool,
};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn create_column(pool: &SqlitePool, name: &str) -> Column {
    Column::create(
        pool,
        &CreateColumn {
            name: name.to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("Failed to create column")
}

async fn create_task(pool: &SqlitePool, column_id: Uuid, name: &str) -> Task {
    Task::create(pool, &CreateTask::new(column_id, name), Uuid::new_v4())
        .await
        .expect("Failed to create task")
        .task
}

async fn attach_image(pool: &SqlitePool, task_id: Uuid, file_name: &str) -> TaskImage {
    let blob_name = format!("{task_id}/{}-{file_name}", Uuid::new_v4());
    TaskImage::create(
        pool,
        &CreateTaskImage {
            task_id,
            image_url: format!("https://localhost/images/{blob_name}"),
            blob_name,
            file_name: file_name.to_string(),
            content_type: "image/png".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("Failed to create image")
}

async fn count(pool: &SqlitePool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

#[tokio::test]
async fn test_columns_get_increasing_order() {
    let (pool, _temp_dir) = create_test_pool().await;

    let mut orders = Vec::new();
    for name in ["To Do", "In Progress", "Done", "Archive"] {
        orders.push(create_column(&pool, name).await.order);
    }
    assert_eq!(orders, vec![1, 2, 3, 4]);

    let listed: Vec<_> = Column::find_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(listed, vec!["To Do", "In Progress", "Done", "Archive"]);
}

#[tokio::test]
async fn test_column_exists() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;

    assert!(Column::exists(&pool, column.id).await.unwrap());
    assert!(!Column::exists(&pool, Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_created_task_has_defaults_and_column_name() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;

    let created = Task::create(&pool, &CreateTask::new(column.id, "Write docs"), Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(created.order, 0);
    assert!(!created.is_favorite);
    assert_eq!(created.column_name, "To Do");
    assert!(created.images.is_empty());
    assert_eq!(created.created_at, created.updated_at);
}

#[tokio::test]
async fn test_list_puts_favorites_first_then_name() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;

    create_task(&pool, column.id, "C Task").await;
    let a = create_task(&pool, column.id, "A Task").await;
    create_task(&pool, column.id, "B Task").await;
    Task::toggle_favorite(&pool, a.id).await.unwrap();

    let tasks = Task::find_all_with_images(&pool).await.unwrap();
    let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A Task", "B Task", "C Task"]);
    assert!(tasks[0].is_favorite);

    let by_column = Task::find_by_column_id_with_images(&pool, column.id)
        .await
        .unwrap();
    assert_eq!(by_column.len(), 3);
    assert_eq!(by_column[0].id, a.id);
}

#[tokio::test]
async fn test_favorite_that_sorts_last_by_name_still_comes_first() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;

    create_task(&pool, column.id, "A Task").await;
    let z = create_task(&pool, column.id, "Z Task").await;
    Task::toggle_favorite(&pool, z.id).await.unwrap();

    let tasks = Task::find_all_with_images(&pool).await.unwrap();
    assert_eq!(tasks[0].id, z.id);
}

#[tokio::test]
async fn test_name_order_is_case_sensitive_byte_order() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;

    for name in ["banana", "apple", "Zebra"] {
        create_task(&pool, column.id, name).await;
    }

    // 'Z' (0x5A) sorts before 'a' (0x61)
    let expected = vec!["Zebra", "apple", "banana"];

    let all = Task::find_all_with_images(&pool).await.unwrap();
    let names: Vec<_> = all.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, expected);

    let by_column = Task::find_by_column_id_with_images(&pool, column.id)
        .await
        .unwrap();
    let names: Vec<_> = by_column.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_list_by_column_filters_other_columns() {
    let (pool, _temp_dir) = create_test_pool().await;
    let todo = create_column(&pool, "To Do").await;
    let done = create_column(&pool, "Done").await;

    create_task(&pool, todo.id, "Mine").await;
    create_task(&pool, done.id, "Other").await;

    let tasks = Task::find_by_column_id_with_images(&pool, todo.id)
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Mine");
    assert_eq!(tasks[0].column_name, "To Do");
}

#[tokio::test]
async fn test_move_sets_column_and_order_exactly() {
    let (pool, _temp_dir) = create_test_pool().await;
    let todo = create_column(&pool, "To Do").await;
    let doing = create_column(&pool, "In Progress").await;
    let task = create_task(&pool, todo.id, "Move me").await;

    assert!(Task::move_to(&pool, task.id, doing.id, 5).await.unwrap());

    let moved = Task::find_with_images(&pool, task.id)
        .await
        .unwrap()
        .expect("task should still exist");
    assert_eq!(moved.column_id, doing.id);
    assert_eq!(moved.order, 5);
    assert_eq!(moved.column_name, "In Progress");
    assert!(moved.updated_at >= task.updated_at);

    // Moving back with a duplicate/negative order is accepted verbatim
    assert!(Task::move_to(&pool, task.id, todo.id, -3).await.unwrap());
    let moved = Task::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(moved.column_id, todo.id);
    assert_eq!(moved.order, -3);
}

#[tokio::test]
async fn test_move_missing_task_changes_nothing() {
    let (pool, _temp_dir) = create_test_pool().await;
    let todo = create_column(&pool, "To Do").await;
    let task = create_task(&pool, todo.id, "Stay").await;

    let moved = Task::move_to(&pool, Uuid::new_v4(), todo.id, 9)
        .await
        .unwrap();
    assert!(!moved);

    let unchanged = Task::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(unchanged, task);
}

#[tokio::test]
async fn test_partial_update_only_touches_name() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;
    let mut data = CreateTask::new(column.id, "Old name");
    data.description = Some("details".to_string());
    data.deadline = Some(chrono::Utc::now());
    let before = Task::create(&pool, &data, Uuid::new_v4())
        .await
        .unwrap()
        .task;

    let after = Task::update(
        &pool,
        before.id,
        &UpdateTask {
            name: Some("New name".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(after.name, "New name");
    assert_eq!(after.description, before.description);
    assert_eq!(after.deadline, before.deadline);
    assert_eq!(after.column_id, before.column_id);
    assert_eq!(after.is_favorite, before.is_favorite);
    assert_eq!(after.order, before.order);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn test_update_missing_task_is_row_not_found() {
    let (pool, _temp_dir) = create_test_pool().await;

    let result = Task::update(&pool, Uuid::new_v4(), &UpdateTask::default()).await;
    assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
}

#[tokio::test]
async fn test_toggle_favorite_twice_restores_flag() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;
    let task = create_task(&pool, column.id, "Star me").await;

    let once = Task::toggle_favorite(&pool, task.id).await.unwrap();
    assert!(once.is_favorite);
    let twice = Task::toggle_favorite(&pool, task.id).await.unwrap();
    assert!(!twice.is_favorite);

    let missing = Task::toggle_favorite(&pool, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(sqlx::Error::RowNotFound)));
}

#[tokio::test]
async fn test_images_listed_by_upload_time() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;
    let task = create_task(&pool, column.id, "Pictures").await;

    let first = attach_image(&pool, task.id, "first.png").await;
    let second = attach_image(&pool, task.id, "second.png").await;

    let images = TaskImage::find_by_task_id(&pool, task.id).await.unwrap();
    let ids: Vec<_> = images.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let with_images = Task::find_with_images(&pool, task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_images.images.len(), 2);
    assert_eq!(with_images.images[0].file_name, "first.png");
}

#[tokio::test]
async fn test_delete_task_cascades_images() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;
    let task = create_task(&pool, column.id, "Doomed").await;
    let image = attach_image(&pool, task.id, "gone.png").await;

    assert!(Task::delete(&pool, task.id).await.unwrap());
    assert!(!Task::delete(&pool, task.id).await.unwrap());
    assert!(TaskImage::find_by_id(&pool, image.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_column_cascades_tasks_and_images() {
    let (pool, _temp_dir) = create_test_pool().await;
    let column = create_column(&pool, "To Do").await;
    let task = create_task(&pool, column.id, "Doomed").await;
    let image = attach_image(&pool, task.id, "gone.png").await;

    assert!(Column::delete(&pool, column.id).await.unwrap());

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM tasks WHERE id = $1", task.id).await,
        0
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM task_images WHERE id = $1", image.id).await,
        0
    );
}

#[tokio::test]
async fn test_column_with_tasks_nests_tasks_and_images() {
    let (pool, _temp_dir) = create_test_pool().await;
    let todo = create_column(&pool, "To Do").await;
    let done = create_column(&pool, "Done").await;
    let task = create_task(&pool, todo.id, "Has picture").await;
    attach_image(&pool, task.id, "pic.gif").await;

    let column = Column::find_with_tasks(&pool, todo.id)
        .await
        .unwrap()
        .expect("column should exist");
    assert_eq!(column.tasks.len(), 1);
    assert_eq!(column.tasks[0].images.len(), 1);

    let board = Column::find_all_with_tasks(&pool).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].id, todo.id);
    assert_eq!(board[0].tasks.len(), 1);
    assert_eq!(board[1].id, done.id);
    assert!(board[1].tasks.is_empty());

    assert!(
        Column::find_with_tasks(&pool, Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );
}
