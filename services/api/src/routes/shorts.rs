//! Short routes: upload, listing, detail and deletion

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, FieldError},
    media_probe::MediaProbe,
    middleware::{AuthUser, auth_middleware},
    models::short::NewShort,
    state::AppState,
    storage::random_object_name,
    validation,
};

/// Storage folder for short sources
pub const SHORT_FOLDER: &str = "clipstream/shorts";
/// Storage folder for short thumbnails
pub const SHORT_THUMBNAIL_FOLDER: &str = "clipstream/shorts/thumbnails";

const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Create the router for short endpoints
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/upload", post(upload))
        .route("/delete/:short_id", delete(delete_short))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/all", get(get_all))
        .route("/short/:short_id", get(get_short))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Upload a new short with its thumbnail
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut video: Option<(String, Vec<u8>)> = None;
    let mut thumbnail: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "video" | "thumbnail" => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let file = Some((file_name, bytes.to_vec()));
                if name == "video" {
                    video = file;
                } else {
                    thumbnail = file;
                }
            }
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                )
            }
            "description" => {
                description = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                )
            }
            _ => {}
        }
    }

    let title = title.unwrap_or_default();
    let description = description.unwrap_or_default();

    let mut errors: Vec<FieldError> = Vec::new();
    if let Err(msg) = validation::validate_title(&title) {
        errors.push(FieldError::new("title", msg));
    }
    if let Err(msg) = validation::validate_description(&description) {
        errors.push(FieldError::new("description", msg));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let Some((video_name, video_bytes)) = video else {
        return Err(ApiError::BadRequest("Video is required".to_string()));
    };
    let Some((thumbnail_name, thumbnail_bytes)) = thumbnail else {
        return Err(ApiError::BadRequest(
            "Thumbnail image for short is required".to_string(),
        ));
    };

    let video_ext = validation::validate_file_type(&video_name, validation::VIDEO_FILE_TYPES)
        .map_err(|msg| ApiError::BadRequest(format!("{} for video", msg)))?;
    let thumbnail_ext =
        validation::validate_file_type(&thumbnail_name, validation::IMAGE_FILE_TYPES)
            .map_err(|msg| ApiError::BadRequest(format!("{} for thumbnail", msg)))?;

    let properties = MediaProbe::probe_bytes(&video_bytes)
        .map_err(|e| ApiError::BadRequest(format!("Unable to read video metadata: {}", e)))?;

    let video_stored = state
        .storage
        .upload(video_bytes, &random_object_name(&video_ext), SHORT_FOLDER)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    let thumbnail_stored = match state
        .storage
        .upload(
            thumbnail_bytes,
            &random_object_name(&thumbnail_ext),
            SHORT_THUMBNAIL_FOLDER,
        )
        .await
    {
        Ok(stored) => stored,
        Err(err) => {
            if let Err(e) = state.storage.delete(&video_stored.file_id).await {
                warn!("Failed to clean up blob {}: {}", video_stored.file_id, e);
            }
            return Err(ApiError::Storage(err.to_string()));
        }
    };

    let new_short = NewShort {
        title,
        description,
        src: video_stored.clone().into(),
        thumbnail: thumbnail_stored.clone().into(),
        properties,
        user_id: auth.id,
    };

    let short = match state.short_repository.create(&new_short).await {
        Ok(short) => short,
        Err(err) => {
            for file_id in [&video_stored.file_id, &thumbnail_stored.file_id] {
                if let Err(e) = state.storage.delete(file_id).await {
                    warn!("Failed to clean up blob {}: {}", file_id, e);
                }
            }
            return Err(ApiError::Storage(err.to_string()));
        }
    };

    Ok(Json(json!({
        "message": "Short is created",
        "data": short
    })))
}

/// Every short
pub async fn get_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let shorts = state
        .short_repository
        .get_all()
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": "Ready",
        "data": shorts
    })))
}

/// Short detail; every read moves the view counter by one
pub async fn get_short(
    State(state): State<AppState>,
    Path(short_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let short = state
        .short_repository
        .view(short_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Content is not found with ID {}", short_id))
        })?;

    Ok(Json(json!({
        "message": "Ready",
        "data": short
    })))
}

/// Delete an owned short with its blobs
pub async fn delete_short(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(short_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let short = state
        .short_repository
        .find_by_id(short_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Content is not found with ID {}", short_id))
        })?;

    if short.user_id != auth.id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    for file_id in [&short.src.file_id, &short.thumbnail.file_id] {
        if let Err(e) = state.storage.delete(file_id).await {
            warn!("Failed to delete blob {}: {}", file_id, e);
        }
    }

    state
        .short_repository
        .delete(short_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": format!("Content with ID {} deleted", short_id)
    })))
}
