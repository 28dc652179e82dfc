//! `POST /upload`
//!
//! Boundary layer for the upload pipeline: reads the `image` part of the
//! multipart form, applies the accept filter (image content type, size limit,
//! one image per request), stages the bytes and hands the staged file to
//! [`UploadPipeline`].

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{debug, info};

use crate::models::{AppState, UploadResult};
use crate::pipeline::UploadPipeline;
use crate::staging::{LocalStage, StagedFile};
use crate::types::{AppError, AppResult};

/// Form field that carries the image.
pub const IMAGE_FIELD: &str = "image";

/// Room for boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let limit = body_limit(state.config.upload.max_file_size);

    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResult>> {
    info!("Upload request received");

    let staged = match multipart {
        Ok(multipart) => {
            receive_image(multipart, &state.stage, state.config.upload.max_file_size).await?
        }
        Err(rejection) => {
            // Not a multipart form at all, so there is no file to speak of
            debug!(%rejection, "Upload request without a multipart body");
            None
        }
    };

    let pipeline = UploadPipeline::new(state.storage.as_ref(), &state.stage);
    let result = pipeline.run(staged).await?;

    Ok(Json(result))
}

struct ReceivedImage {
    data: axum::body::Bytes,
    original_name: String,
    content_type: String,
}

/// Pull the single image out of the form and stage it.
///
/// The form is read completely before anything touches the disk, so a
/// rejected request never leaves a staged file behind.
pub async fn receive_image(
    mut multipart: Multipart,
    stage: &LocalStage,
    max_file_size: u64,
) -> AppResult<Option<StagedFile>> {
    let mut received: Option<ReceivedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        // Text fields and other file fields are ignored
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        // An empty file input still sends the part, with filename=""
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        if received.is_some() {
            return Err(AppError::InvalidRequest(
                "Only one image may be uploaded per request".to_string(),
            ));
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !is_image(&content_type) {
            return Err(AppError::InvalidRequest(
                "Only image files are allowed".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?;
        if data.len() as u64 > max_file_size {
            return Err(AppError::PayloadTooLarge(max_file_size));
        }

        received = Some(ReceivedImage {
            data,
            original_name,
            content_type,
        });
    }

    match received {
        Some(image) => {
            let staged = stage
                .stage(&image.data, Some(&image.original_name), &image.content_type)
                .await?;
            info!(
                original_name = %image.original_name,
                file_name = %staged.file_name,
                size = staged.size,
                "Image received"
            );
            Ok(Some(staged))
        }
        None => Ok(None),
    }
}

fn is_image(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

fn multipart_error(err: MultipartError, max_file_size: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(max_file_size)
    } else {
        AppError::InvalidRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

fn body_limit(max_file_size: u64) -> usize {
    usize::try_from(max_file_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
}
