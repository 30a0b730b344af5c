//! Reaction routes: like/dislike toggles and counts

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware, optional_identity},
    repositories::reaction::Side,
    state::AppState,
};

/// Create the router for reaction endpoints
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/like/:video_id", post(toggle_like))
        .route("/dislike/:video_id", post(toggle_dislike))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/likes/:video_id", get(get_likes))
        .merge(protected)
}

async fn ensure_video_and_user(
    state: &AppState,
    video_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    let video_exists = state
        .video_repository
        .exists(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    let user_exists = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .is_some();

    if !video_exists || !user_exists {
        return Err(ApiError::NotFound("Video or user not found".to_string()));
    }
    Ok(())
}

/// Toggle the caller's like on a video
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ensure_video_and_user(&state, video_id, auth.id).await?;

    let liked = state
        .reaction_repository
        .toggle(Side::Liked, video_id, auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    let message = if liked { "Video liked" } else { "Like removed" };
    Ok(Json(json!({"message": message, "liked": liked})))
}

/// Toggle the caller's dislike on a video
pub async fn toggle_dislike(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ensure_video_and_user(&state, video_id, auth.id).await?;

    let disliked = state
        .reaction_repository
        .toggle(Side::Disliked, video_id, auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    let message = if disliked {
        "Video disliked"
    } else {
        "Dislike removed"
    };
    Ok(Json(json!({"message": message, "disliked": disliked})))
}

/// Reaction counts for a video; membership flags are filled in when the
/// caller presents a valid session, and stay false otherwise
pub async fn get_likes(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let video_exists = state
        .video_repository
        .exists(video_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if !video_exists {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let user_id = optional_identity(&headers, &state);

    let summary = state
        .reaction_repository
        .summary(video_id, user_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(summary))
}
