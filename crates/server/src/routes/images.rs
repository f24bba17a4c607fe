use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get},
};
use bytes::Bytes;
use db::models::task::Task;
use serde::Deserialize;
use services::services::image::{MAX_IMAGE_SIZE, UploadRejection, validate_upload};
use tracing::instrument;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::PathParams, routes::types::ImageDto};

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Body limit for uploads: above the image size rule so oversized files are
/// answered by validation instead of the transport.
pub const UPLOAD_BODY_LIMIT: usize = 2 * MAX_IMAGE_SIZE;

#[derive(Debug, Deserialize)]
pub struct ImagePathParams {
    pub image_id: Uuid,
}

struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or(FILE_FIELD).to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        }));
    }
    Ok(None)
}

#[instrument(name = "images.list", skip(state, task), fields(task_id = %task.id))]
pub async fn list_images(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
) -> Result<Json<Vec<ImageDto>>, ApiError> {
    let images = state.images().list_for_task(task.id).await?;
    Ok(Json(images.into_iter().map(ImageDto::from).collect()))
}

#[instrument(name = "images.upload", skip(state, task, multipart), fields(task_id = %task.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or(UploadRejection::Missing)?;
    validate_upload(&file.content_type, file.bytes.len())?;

    let image = state
        .images()
        .upload(task.id, file.bytes, &file.file_name, &file.content_type)
        .await?;

    let location = format!("/api/tasks/{}/images", task.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ImageDto::from(image)),
    ))
}

#[instrument(name = "images.delete", skip(state, task), fields(task_id = %task.id))]
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(task): Extension<Task>,
    PathParams(params): PathParams<ImagePathParams>,
) -> Result<StatusCode, ApiError> {
    if state.images().delete_for_task(task.id, params.image_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Image not found"))
    }
}

/// Routes relative to `/tasks/{task_id}`; the task is loaded by the caller's
/// middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/images",
            get(list_images)
                .post(upload_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/images/{image_id}", delete(delete_image))
}
