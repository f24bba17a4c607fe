use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::validation::ValidationError;
use serde_json::json;
use services::services::image::{ImageError, UploadRejection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Invalid column ID")]
    InvalidColumn,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<UploadRejection> for ApiError {
    fn from(err: UploadRejection) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

fn internal_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::InvalidColumn => (StatusCode::BAD_REQUEST, "Invalid column ID".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Multipart(err) => (err.status(), err.body_text()),
            ApiError::Database(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Database(err) => {
                tracing::error!(?err, "database error");
                internal_error()
            }
            ApiError::Image(ImageError::Database(sqlx::Error::RowNotFound)) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Image(err) => {
                tracing::error!(?err, "image storage error");
                internal_error()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
