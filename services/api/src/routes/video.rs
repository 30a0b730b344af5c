//! Video routes: upload, listing, detail and deletion

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
    models::video::NewVideo,
    state::AppState,
    storage::{StoredFile, random_object_name},
    validation,
};

/// Storage folder for video sources
pub const VIDEO_FOLDER: &str = "clipstream/contents";
/// Storage folder for video thumbnails
pub const THUMBNAIL_FOLDER: &str = "clipstream/contents/thumbnails";

/// Upload size ceiling for multipart video bodies
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Create the router for video endpoints
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/upload", post(upload))
        .route("/delete/:video_id", delete(delete_video))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/all", get(get_all))
        .route("/video/:video_id", get(get_video))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    video: Option<(String, Vec<u8>)>,
    thumbnail: Option<(String, Vec<u8>)>,
}

async fn read_upload_form(multipart: &mut Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

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
                    form.video = file;
                } else {
                    form.thumbnail = file;
                }
            }
            other => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                match other {
                    "title" => form.title = Some(text),
                    "description" => form.description = Some(text),
                    "tags" => form.tags.push(text),
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Upload a new video with its thumbnail and tags
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_upload_form(&mut multipart).await?;

    let title = form.title.unwrap_or_default();
    let description = form.description.unwrap_or_default();

    let mut errors: Vec<FieldError> = Vec::new();
    if let Err(msg) = validation::validate_title(&title) {
        errors.push(FieldError::new("title", msg));
    }
    if let Err(msg) = validation::validate_description(&description) {
        errors.push(FieldError::new("description", msg));
    }

    let mut tag_ids: Vec<Uuid> = Vec::with_capacity(form.tags.len());
    for raw in &form.tags {
        match Uuid::parse_str(raw) {
            Ok(id) => tag_ids.push(id),
            Err(_) => {
                errors.push(FieldError::new("tags", format!("Invalid tag ID {}", raw)));
            }
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let Some((video_name, video_bytes)) = form.video else {
        return Err(ApiError::BadRequest("Video is required".to_string()));
    };
    if video_name.is_empty() {
        return Err(ApiError::BadRequest("No file selected for video".to_string()));
    }
    let Some((thumbnail_name, thumbnail_bytes)) = form.thumbnail else {
        return Err(ApiError::BadRequest(
            "Thumbnail image for video is required".to_string(),
        ));
    };
    if thumbnail_name.is_empty() {
        return Err(ApiError::BadRequest(
            "No file selected for thumbnail".to_string(),
        ));
    }

    let video_ext = validation::validate_file_type(&video_name, validation::VIDEO_FILE_TYPES)
        .map_err(|msg| ApiError::BadRequest(format!("{} for video", msg)))?;
    let thumbnail_ext =
        validation::validate_file_type(&thumbnail_name, validation::IMAGE_FILE_TYPES)
            .map_err(|msg| ApiError::BadRequest(format!("{} for thumbnail", msg)))?;

    // Resolve tags before any blob goes out, so a bad tag id cannot leave
    // orphaned uploads behind.
    let found = state
        .tag_repository
        .find_existing(&tag_ids)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    let found_ids: std::collections::HashSet<Uuid> = found.iter().map(|t| t.id).collect();
    let missing: Vec<String> = tag_ids
        .iter()
        .filter(|id| !found_ids.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::validation(
            "tags",
            format!("Tags not found with IDs: {}", missing.join(", ")),
        ));
    }

    let properties = MediaProbe::probe_bytes(&video_bytes)
        .map_err(|e| ApiError::BadRequest(format!("Unable to read video metadata: {}", e)))?;

    let video_stored = state
        .storage
        .upload(video_bytes, &random_object_name(&video_ext), VIDEO_FOLDER)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    let thumbnail_stored = match state
        .storage
        .upload(
            thumbnail_bytes,
            &random_object_name(&thumbnail_ext),
            THUMBNAIL_FOLDER,
        )
        .await
    {
        Ok(stored) => stored,
        Err(err) => {
            cleanup_blobs(&state, &[&video_stored]).await;
            return Err(ApiError::Storage(err.to_string()));
        }
    };

    let new_video = NewVideo {
        title,
        description,
        src: video_stored.clone().into(),
        thumbnail: thumbnail_stored.clone().into(),
        properties,
        user_id: auth.id,
        tag_ids,
    };

    let video = match state.video_repository.create(&new_video).await {
        Ok(video) => video,
        Err(err) => {
            cleanup_blobs(&state, &[&video_stored, &thumbnail_stored]).await;
            return Err(ApiError::Storage(err.to_string()));
        }
    };

    Ok(Json(json!({
        "message": "Video is created",
        "data": {
            "id": video.id,
            "title": video.title,
            "description": video.description,
            "src": video.src,
            "thumbnail": video.thumbnail,
            "tags": found,
            "properties": video.properties,
            "created_at": video.created_at,
            "updated_at": video.updated_at,
        }
    })))
}

async fn cleanup_blobs(state: &AppState, blobs: &[&StoredFile]) {
    for blob in blobs {
        if let Err(e) = state.storage.delete(&blob.file_id).await {
            warn!("Failed to clean up blob {}: {}", blob.file_id, e);
        }
    }
}

/// Every video
pub async fn get_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let videos = state
        .video_repository
        .get_all()
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": "Ready",
        "data": videos
    })))
}

/// Video detail; every read moves the view counter by one
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let video = state
        .video_repository
        .view(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Content is not found with ID {}", video_id))
        })?;

    Ok(Json(json!({
        "message": "Ready",
        "data": video
    })))
}

/// Delete an owned video with its blobs
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let video = state
        .video_repository
        .find_by_id(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Content is not found with ID {}", video_id))
        })?;

    if video.user_id != auth.id {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    // Storage orphans are tolerable; a row pointing at a deleted blob is
    // not, so blob deletion failures are logged and the row still goes.
    for file_id in [&video.src.file_id, &video.thumbnail.file_id] {
        if let Err(e) = state.storage.delete(file_id).await {
            warn!("Failed to delete blob {}: {}", file_id, e);
        }
    }

    state
        .video_repository
        .delete(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": format!("Content with ID {} deleted", video_id)
    })))
}
