use axum::{
    Extension, Json, Router,
    extract::State,
    http::{StatusCode, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, put},
};
use db::{
    models::{
        column::Column,
        task::{CreateTask, MoveTask, Task, UpdateTask},
    },
    validation::validate_task_name,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{JsonBody, PathParams},
    middleware::load_task_middleware,
    routes::{images, types::TaskDto},
};

async fn ensure_column_exists(state: &AppState, column_id: Uuid) -> Result<(), ApiError> {
    if Column::exists(state.pool(), column_id).await? {
        Ok(())
    } else {
        Err(ApiError::InvalidColumn)
    }
}

#[instrument(name = "tasks.list", skip(state))]
pub async fn get_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskDto>>, ApiError> {
    let tasks = Task::find_all_with_images(state.pool()).await?;
    Ok(Json(tasks.into_iter().map(TaskDto::from).collect()))
}

/// Tasks of one column. An unknown column simply has no tasks.
#[instrument(name = "tasks.list_by_column", skip(state))]
pub async fn get_tasks_by_column(
    State(state): State<AppState>,
    PathParams(column_id): PathParams<Uuid>,
) -> Result<Json<Vec<TaskDto>>, ApiError> {
    let tasks = Task::find_by_column_id_with_images(state.pool(), column_id).await?;
    Ok(Json(tasks.into_iter().map(TaskDto::from).collect()))
}

#[instrument(name = "tasks.get", skip(state, task), fields(task_id = %task.id))]
pub async fn get_task(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
) -> Result<Json<TaskDto>, ApiError> {
    let task = Task::find_with_images(state.pool(), task.id)
        .await?
        .ok_or(ApiError::NotFound("Task not found"))?;
    Ok(Json(task.into()))
}

#[instrument(name = "tasks.create", skip(state, payload), fields(column_id = %payload.column_id))]
pub async fn create_task(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateTask>,
) -> Result<impl IntoResponse, ApiError> {
    validate_task_name(&payload.name)?;
    ensure_column_exists(&state, payload.column_id).await?;

    let task = Task::create(state.pool(), &payload, Uuid::new_v4()).await?;
    tracing::info!(task_id = %task.id, column_id = %task.column_id, "Created task");

    let location = format!("/api/tasks/{}", task.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TaskDto::from(task)),
    ))
}

#[instrument(name = "tasks.update", skip(state, task, payload), fields(task_id = %task.id))]
pub async fn update_task(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    JsonBody(payload): JsonBody<UpdateTask>,
) -> Result<Json<TaskDto>, ApiError> {
    if let Some(name) = &payload.name {
        validate_task_name(name)?;
    }
    if let Some(column_id) = payload.column_id {
        ensure_column_exists(&state, column_id).await?;
    }

    let updated = Task::update(state.pool(), task.id, &payload).await?;
    Ok(Json(updated.into()))
}

#[instrument(name = "tasks.delete", skip(state, task), fields(task_id = %task.id))]
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
) -> Result<StatusCode, ApiError> {
    let removed_blobs = state.images().purge_task_blobs(task.id).await?;

    if !Task::delete(state.pool(), task.id).await? {
        return Err(ApiError::NotFound("Task not found"));
    }
    tracing::info!(task_id = %task.id, removed_blobs, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}

/// Move a task to a column and position.
///
/// The target column is checked first, so an unknown column answers 400 even
/// when the task does not exist either.
#[instrument(name = "tasks.move", skip(state, payload), fields(column_id = %payload.new_column_id, order = payload.new_order))]
pub async fn move_task(
    State(state): State<AppState>,
    PathParams(task_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<MoveTask>,
) -> Result<StatusCode, ApiError> {
    ensure_column_exists(&state, payload.new_column_id).await?;

    if !Task::move_to(
        state.pool(),
        task_id,
        payload.new_column_id,
        payload.new_order,
    )
    .await?
    {
        return Err(ApiError::NotFound("Task not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "tasks.toggle_favorite", skip(state, task), fields(task_id = %task.id))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
) -> Result<Json<TaskDto>, ApiError> {
    let task = Task::toggle_favorite(state.pool(), task.id).await?;
    Ok(Json(task.into()))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/favorite", put(toggle_favorite))
        .merge(images::router())
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/column/{column_id}", get(get_tasks_by_column))
        .route("/{task_id}/move", put(move_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
