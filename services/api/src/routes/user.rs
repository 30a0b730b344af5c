//! Routes for the authenticated user's own profile

use axum::{
    Extension, Json, Router,
    extract::{Multipart, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult, FieldError},
    middleware::{AuthUser, auth_middleware},
    models::{ProfileImage, user::{UpdateUser, UserResponse}},
    routes::auth::USER_IMAGE_FOLDER,
    state::AppState,
    storage::random_object_name,
    validation,
};

/// Create the router for user profile endpoints
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/update-me", put(update_me))
        .route("/upload-profile", post(upload_profile))
        .route("/delete-profile-img", delete(delete_profile_img))
        .route("/delete-me", delete(delete_me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Get the currently authenticated user's details
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "User retrieved successfully",
        "data": UserResponse::from(user)
    })))
}

/// Apply a partial profile update
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    let mut errors: Vec<FieldError> = Vec::new();
    if let Some(first_name) = &payload.first_name {
        if let Err(msg) = validation::validate_name(first_name) {
            errors.push(FieldError::new("first_name", msg));
        }
    }
    if let Some(last_name) = &payload.last_name {
        if let Err(msg) = validation::validate_name(last_name) {
            errors.push(FieldError::new("last_name", msg));
        }
    }
    if let Some(cover) = &payload.cover {
        if cover.is_empty() {
            errors.push(FieldError::new("cover", "Cover must not be empty"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = state
        .user_repository
        .update_profile(auth.id, &payload)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "User updated successfully",
        "data": {
            "id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "cover": user.cover,
        }
    })))
}

/// Upload a new profile image and retire the previous one
pub async fn upload_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("profile_img") {
            let file_name = field.file_name().map(str::to_string).unwrap_or_default();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::BadRequest("No profile image provided".to_string()));
    };
    if file_name.is_empty() {
        return Err(ApiError::BadRequest("No selected profile image".to_string()));
    }
    let extension = validation::validate_file_type(&file_name, validation::IMAGE_FILE_TYPES)
        .map_err(ApiError::BadRequest)?;

    let stored = state
        .storage
        .upload(bytes, &random_object_name(&extension), USER_IMAGE_FOLDER)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    // Retire the previous image, but only when it is a real upload that is
    // still present in storage. Failures here do not block the update.
    if let Some(previous) = user.profile_img.as_ref().filter(|img| !img.is_default) {
        match state.storage.exists(&previous.file_id).await {
            Ok(true) => {
                if let Err(e) = state.storage.delete(&previous.file_id).await {
                    warn!("Failed to delete previous profile image {}: {}", previous.file_id, e);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to check previous profile image {}: {}", previous.file_id, e),
        }
    }

    let image = ProfileImage::uploaded(stored.clone());
    match state.user_repository.set_profile_image(auth.id, &image).await {
        Ok(Some(updated)) => Ok(Json(json!({
            "message": "Profile image is updated",
            "user": {
                "id": updated.id,
                "profile_img": updated.profile_img,
            }
        }))),
        Ok(None) => Err(ApiError::NotFound("User not found".to_string())),
        Err(err) => {
            if let Err(cleanup_err) = state.storage.delete(&stored.file_id).await {
                warn!(
                    "Failed to clean up uploaded profile image {}: {}",
                    stored.file_id, cleanup_err
                );
            }
            Err(ApiError::Storage(err.to_string()))
        }
    }
}

/// Reset the profile image to the default placeholder
pub async fn delete_profile_img(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let Some(current) = user.profile_img.as_ref().filter(|img| !img.is_default) else {
        return Err(ApiError::BadRequest(
            "Unable to delete default image".to_string(),
        ));
    };

    if let Err(e) = state.storage.delete(&current.file_id).await {
        warn!("Failed to delete profile image {}: {}", current.file_id, e);
    }

    let updated = state
        .user_repository
        .set_profile_image(auth.id, &ProfileImage::default_image())
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "Profile image is deleted",
        "user": {
            "id": updated.id,
            "profile_img": updated.profile_img,
        }
    })))
}

/// Delete the authenticated user's account and everything it owns
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Blobs go first; a failed delete leaves a storage orphan, which is
    // acceptable, while a dangling database reference is not.
    let mut blob_ids: Vec<String> = Vec::new();
    if let Some(img) = user.profile_img.as_ref().filter(|img| !img.is_default) {
        blob_ids.push(img.file_id.clone());
    }
    let descriptors = state
        .user_repository
        .media_descriptors(auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    blob_ids.extend(descriptors.into_iter().map(|d| d.file_id));

    for file_id in &blob_ids {
        if let Err(e) = state.storage.delete(file_id).await {
            warn!("Failed to delete blob {}: {}", file_id, e);
        }
    }

    state
        .user_repository
        .delete(auth.id)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(Json(json!({"message": "Deleted successfully"})))
}
