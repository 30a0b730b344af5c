//! Registration, verification and session routes

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult, FieldError},
    jwt::TokenType,
    middleware::{ACCESS_COOKIE, REFRESH_COOKIE, get_cookie_value},
    models::{
        ProfileImage,
        user::{NewUser, UserResponse},
    },
    state::AppState,
    storage::{StoredFile, random_object_name},
    validation,
};

/// Storage folder for profile images
pub const USER_IMAGE_FOLDER: &str = "clipstream/user";

/// Create the router for authentication endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/create", post(create_user))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/status", get(status))
}

fn build_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax; HttpOnly",
        name, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", 0, secure)
}

fn append_cookie(response: &mut Response, cookie: &str) -> ApiResult<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::Unexpected(format!("invalid cookie header: {}", e)))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

/// Request body for starting a registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
}

/// Request body for verifying an email
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub token: String,
}

/// Request body for logging in
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Start a registration attempt for an email address
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Err(msg) = validation::validate_email(&payload.email) {
        return Err(ApiError::validation("email", msg));
    }

    let exists = state
        .user_repository
        .email_exists(&payload.email)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;
    if exists {
        return Err(ApiError::Conflict(
            "This user is already registered".to_string(),
        ));
    }

    state.registration.start(&payload.email).await?;

    Ok(Json(json!({
        "message": format!("code is sent to {}", payload.email)
    })))
}

/// Exchange a mailed verification token for a registry token
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Err(msg) = validation::validate_email(&payload.email) {
        return Err(ApiError::validation("email", msg));
    }

    let registry_token = state
        .registration
        .verify(&payload.email, &payload.token)
        .await?;

    Ok(Json(json!({
        "passed": true,
        "registry_token": registry_token,
        "message": "Verification is passed"
    })))
}

#[derive(Default)]
struct CreateUserForm {
    email: Option<String>,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_img: Option<(String, Vec<u8>)>,
}

async fn read_create_form(multipart: &mut Multipart) -> ApiResult<CreateUserForm> {
    let mut form = CreateUserForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "profile_img" => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                form.profile_img = Some((file_name, bytes.to_vec()));
            }
            other => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                match other {
                    "email" => form.email = Some(text),
                    "token" => form.token = Some(text),
                    "username" => form.username = Some(text),
                    "password" => form.password = Some(text),
                    "first_name" => form.first_name = Some(text),
                    "last_name" => form.last_name = Some(text),
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Finalize account creation for a verified email
pub async fn create_user(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let form = read_create_form(&mut multipart).await?;

    let email = form.email.unwrap_or_default();
    let token = form.token.unwrap_or_default();
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    let first_name = form.first_name.unwrap_or_default();
    let last_name = form.last_name.unwrap_or_default();

    let mut errors: Vec<FieldError> = Vec::new();
    if let Err(msg) = validation::validate_email(&email) {
        errors.push(FieldError::new("email", msg));
    }
    if token.is_empty() {
        errors.push(FieldError::new("token", "Token is required"));
    }
    if let Err(msg) = validation::validate_username(&username) {
        errors.push(FieldError::new("username", msg));
    }
    if let Err(msg) = validation::validate_password(&password) {
        errors.push(FieldError::new("password", msg));
    }
    if let Err(msg) = validation::validate_name(&first_name) {
        errors.push(FieldError::new("first_name", msg));
    }
    if let Err(msg) = validation::validate_name(&last_name) {
        errors.push(FieldError::new("last_name", msg));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    state.registration.check_registry_token(&email, &token).await?;

    let mut uploaded: Option<StoredFile> = None;
    let profile_img = match form.profile_img {
        Some((file_name, bytes)) => {
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
            uploaded = Some(stored.clone());
            Some(ProfileImage::uploaded(stored))
        }
        None => None,
    };

    let new_user = NewUser {
        email: email.clone(),
        username,
        password,
        first_name,
        last_name,
        profile_img,
    };

    match state.user_repository.create(&new_user).await {
        Ok(user) => {
            state.registration.consume_registry_token(&email).await;
            Ok((StatusCode::CREATED, Json(UserResponse::from(user))).into_response())
        }
        Err(err) => {
            // The row insert failed after the blob went out; compensate.
            if let Some(stored) = uploaded {
                if let Err(cleanup_err) = state.storage.delete(&stored.file_id).await {
                    warn!(
                        "Failed to clean up uploaded profile image {}: {}",
                        stored.file_id, cleanup_err
                    );
                }
            }
            Err(ApiError::from_db(err, "Email or username is already taken"))
        }
    }
}

/// Log a user in and set the session cookies
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    if let Err(msg) = validation::validate_email(&payload.email) {
        return Err(ApiError::validation("email", msg));
    }

    let user = state
        .user_repository
        .find_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?
        .ok_or(ApiError::Unauthorized)?;

    if !state.user_repository.verify_password(&user, &payload.password)? {
        return Err(ApiError::Unauthorized);
    }

    let access_token = state.jwt_service.generate_access_token(user.id)?;
    let refresh_token = state.jwt_service.generate_refresh_token(user.id)?;

    let mut response = Json(json!({"message": "Login successful"})).into_response();
    append_cookie(
        &mut response,
        &build_cookie(
            ACCESS_COOKIE,
            &access_token,
            state.jwt_service.access_token_expiry(),
            state.config.cookie_secure,
        ),
    )?;
    append_cookie(
        &mut response,
        &build_cookie(
            REFRESH_COOKIE,
            &refresh_token,
            state.jwt_service.refresh_token_expiry(),
            state.config.cookie_secure,
        ),
    )?;

    Ok(response)
}

fn refresh_claims(state: &AppState, headers: &HeaderMap) -> ApiResult<crate::jwt::Claims> {
    let token = get_cookie_value(headers, REFRESH_COOKIE).ok_or(ApiError::Unauthorized)?;
    let claims = state
        .jwt_service
        .validate_token(&token)
        .map_err(|_| ApiError::Unauthorized)?;
    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized);
    }
    Ok(claims)
}

/// Mint a new access cookie from a valid refresh cookie
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let claims = refresh_claims(&state, &headers)?;

    let access_token = state.jwt_service.generate_access_token(claims.sub)?;

    let mut response = Json(json!({"message": "Token refreshed"})).into_response();
    append_cookie(
        &mut response,
        &build_cookie(
            ACCESS_COOKIE,
            &access_token,
            state.jwt_service.access_token_expiry(),
            state.config.cookie_secure,
        ),
    )?;

    Ok(response)
}

/// Clear both session cookies
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    refresh_claims(&state, &headers)?;

    let mut response = Json(json!({"message": "Successfully logged out"})).into_response();
    append_cookie(
        &mut response,
        &clear_cookie(ACCESS_COOKIE, state.config.cookie_secure),
    )?;
    append_cookie(
        &mut response,
        &clear_cookie(REFRESH_COOKIE, state.config.cookie_secure),
    )?;

    Ok(response)
}

/// Report whether the caller holds a valid refresh cookie
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let status = refresh_claims(&state, &headers).is_ok();
    Json(json!({"status": status}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_are_http_only_and_scoped() {
        let cookie = build_cookie(ACCESS_COOKIE, "tok", 900, false);
        assert_eq!(
            cookie,
            "access_token=tok; Path=/; Max-Age=900; SameSite=Lax; HttpOnly"
        );

        let secure = build_cookie(REFRESH_COOKIE, "tok", 604800, true);
        assert!(secure.ends_with("; Secure"));
    }

    #[test]
    fn clearing_a_cookie_zeroes_its_age() {
        let cookie = clear_cookie(ACCESS_COOKIE, false);
        assert!(cookie.contains("Max-Age=0"));
    }
}
