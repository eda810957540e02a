use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use super::image;
use crate::types::Context;
use std::sync::Arc;

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "OK", "service": "Image Converter API" })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/health", get(health_check))
        .merge(image::get_router())
}
