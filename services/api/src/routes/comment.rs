//! Comment routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::comment::CreateCommentRequest,
    state::AppState,
    validation,
};

/// Create the router for comment endpoints
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/write/:video_id", post(write_comment))
        .route("/delete/:comment_id", delete(delete_comment))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/video/:video_id", get(get_video_comments))
        .merge(protected)
}

/// Write a comment under a video
pub async fn write_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Err(msg) = validation::validate_comment_text(&payload.text) {
        return Err(ApiError::validation("text", msg));
    }

    let video_exists = state
        .video_repository
        .exists(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if !video_exists {
        return Err(ApiError::NotFound(format!(
            "Content is not found with ID {}",
            video_id
        )));
    }

    let comment = state
        .comment_repository
        .create(auth.id, video_id, &payload.text)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": "OK",
        "data": {
            "user_id": comment.user_id,
            "video_id": comment.video_id,
            "text": comment.text,
        }
    })))
}

/// Comments under a video
pub async fn get_video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let video_exists = state
        .video_repository
        .exists(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if !video_exists {
        return Err(ApiError::NotFound(format!(
            "Content is not found with ID {}",
            video_id
        )));
    }

    let comments = state
        .comment_repository
        .list_for_video(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": "OK",
        "data": comments
    })))
}

/// Delete an owned comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let owner = state
        .comment_repository
        .owner_id(comment_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if owner != auth.id {
        return Err(ApiError::Forbidden("Permission denied".to_string()));
    }

    let deleted = state
        .comment_repository
        .delete(comment_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if !deleted {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    Ok(Json(json!({"message": "Comment deleted successfully"})))
}
