use super::service::service;
use crate::{modules::image::middleware::Upload, types::Context};
use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    Upload(payload): Upload,
) -> impl IntoResponse {
    service(ctx, payload).await
}
