use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use db::models::task::Task;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::PathParams};

/// Path parameters shared by every route under `/tasks/{task_id}`.
///
/// Deserializing into a struct ignores any further parameters such as
/// `image_id`, so one middleware serves all nested routes.
#[derive(Debug, Deserialize)]
pub struct TaskPathParams {
    pub task_id: Uuid,
}

/// Load the addressed task and insert it into the request extensions.
///
/// Answers 404 "Task not found" before the handler runs when it does not exist.
pub async fn load_task_middleware(
    State(state): State<AppState>,
    PathParams(params): PathParams<TaskPathParams>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let task = match Task::find_by_id(state.pool(), params.task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            tracing::warn!("Task {} not found", params.task_id);
            return Err(ApiError::NotFound("Task not found"));
        }
        Err(e) => {
            tracing::error!("Failed to fetch task {}: {}", params.task_id, e);
            return Err(ApiError::Database(e));
        }
    };

    request.extensions_mut().insert(task);

    Ok(next.run(request).await)
}
