use super::types::{request, response};
use crate::{types::Context, utils::codec};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use std::sync::Arc;

pub async fn service(_: Arc<Context>, payload: request::Payload) -> response::Response {
    tracing::info!(
        "Converting image: {} ({})",
        payload.file_name,
        payload.mime_type
    );

    let bytes = payload.bytes.clone();
    let converted = tokio::task::spawn_blocking(move || codec::to_rgba_png(&bytes))
        .await
        .map_err(|err| {
            tracing::error!("Conversion task for {} did not finish: {}", payload.file_name, err);
            response::Error::Internal
        })?
        .map_err(|err| {
            tracing::error!("Error converting image {}: {}", payload.file_name, err);
            response::Error::ConversionFailed(err.to_string())
        })?;

    tracing::debug!(
        "Converted {} to {}x{} RGBA PNG ({} -> {} bytes)",
        payload.file_name,
        converted.width,
        converted.height,
        payload.size,
        converted.png.len()
    );

    let base64 = BASE64_STANDARD.encode(&converted.png);

    Ok(response::Success::Converted(
        response::ConversionResult::new(payload.mime_type, payload.size, &converted.png, base64),
    ))
}
