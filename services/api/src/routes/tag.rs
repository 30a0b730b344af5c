//! Tag routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::tag::TagRequest,
    state::AppState,
    validation,
};

/// Create the router for tag endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/all", get(get_all))
        .route("/edit/:tag_id", put(update_tag))
        .route("/delete/:tag_id", delete(delete_tag))
}

/// Create a tag
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<TagRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Err(msg) = validation::validate_tag_title(&payload.title) {
        return Err(ApiError::validation("title", msg));
    }

    let exists = state
        .tag_repository
        .exists_by_title(&payload.title)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if exists {
        return Err(ApiError::Conflict("Tag already exists".to_string()));
    }

    let tag = state
        .tag_repository
        .create(&payload.title)
        .await
        .map_err(|e| ApiError::from_db(e, "Tag already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Tag created successfully",
            "data": tag
        })),
    ))
}

/// Every tag
pub async fn get_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let tags = state
        .tag_repository
        .get_all()
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "message": "Ready",
        "data": tags
    })))
}

/// Rename a tag
pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
    Json(payload): Json<TagRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Err(msg) = validation::validate_tag_title(&payload.title) {
        return Err(ApiError::validation("title", msg));
    }

    let tag = state
        .tag_repository
        .find_by_id(tag_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if tag.is_none() {
        return Err(ApiError::NotFound("Tag not found".to_string()));
    }

    state
        .tag_repository
        .update(tag_id, &payload.title)
        .await
        .map_err(|e| ApiError::from_db(e, "Tag already exists"))?;

    Ok(Json(json!({"message": "Tag updated successfully"})))
}

/// Delete a tag and its video links
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_repository
        .find_by_id(tag_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if tag.is_none() {
        return Err(ApiError::NotFound("Tag not found".to_string()));
    }

    state
        .tag_repository
        .delete(tag_id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({"message": "Deleted successfully"})))
}
