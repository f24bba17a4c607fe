use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use db::{
    models::column::{Column, ColumnWithTasks, CreateColumn},
    validation::validate_column_name,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{JsonBody, PathParams},
    routes::types::ColumnDto,
};

#[instrument(name = "columns.list", skip(state))]
pub async fn get_columns(State(state): State<AppState>) -> Result<Json<Vec<ColumnDto>>, ApiError> {
    let columns = Column::find_all_with_tasks(state.pool()).await?;
    Ok(Json(columns.into_iter().map(ColumnDto::from).collect()))
}

#[instrument(name = "columns.get", skip(state))]
pub async fn get_column(
    State(state): State<AppState>,
    PathParams(column_id): PathParams<Uuid>,
) -> Result<Json<ColumnDto>, ApiError> {
    let column = Column::find_with_tasks(state.pool(), column_id)
        .await?
        .ok_or(ApiError::NotFound("Column not found"))?;
    Ok(Json(column.into()))
}

#[instrument(name = "columns.create", skip(state, payload))]
pub async fn create_column(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateColumn>,
) -> Result<impl IntoResponse, ApiError> {
    validate_column_name(&payload.name)?;

    let column = Column::create(state.pool(), &payload, Uuid::new_v4()).await?;
    tracing::info!(column_id = %column.id, order = column.order, "Created column");

    let location = format!("/api/columns/{}", column.id);
    let dto = ColumnDto::from(ColumnWithTasks {
        column,
        tasks: Vec::new(),
    });
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(dto)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/columns", get(get_columns).post(create_column))
        .route("/columns/{column_id}", get(get_column))
}
