//! API service routes

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;

use crate::state::AppState;

pub mod auth;
pub mod comment;
pub mod reaction;
pub mod shorts;
pub mod tag;
pub mod user;
pub mod video;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth::router())
        .nest("/user", user::router(state.clone()))
        .nest("/video", video::router(state.clone()))
        .nest("/shorts", shorts::router(state.clone()))
        .nest("/tags", tag::router())
        .nest("/comments", comment::router(state.clone()))
        .nest("/reaction", reaction::router(state.clone()))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "clipstream-api"
    }))
}
