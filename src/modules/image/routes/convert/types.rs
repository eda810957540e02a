pub mod request {
    pub use crate::modules::image::middleware::UploadedImage as Payload;
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde::Serialize;
    use serde_json::json;

    pub const CONVERTED_FORMAT: &str = "image/png";
    pub const COLOR_SPACE: &str = "RGBA";
    pub const NOTE: &str = "Output format is RGBA PNG, compatible with OpenAI Vision API";

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct ConversionResult {
        pub success: bool,
        pub original_format: String,
        pub converted_format: &'static str,
        pub color_space: &'static str,
        pub original_size: usize,
        pub converted_size: usize,
        pub base64: String,
        pub note: &'static str,
    }

    impl ConversionResult {
        pub fn new(
            original_format: String,
            original_size: usize,
            png: &[u8],
            base64: String,
        ) -> Self {
            Self {
                success: true,
                original_format,
                converted_format: CONVERTED_FORMAT,
                color_space: COLOR_SPACE,
                original_size,
                converted_size: png.len(),
                base64,
                note: NOTE,
            }
        }
    }

    pub enum Success {
        Converted(ConversionResult),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Converted(result) => (StatusCode::OK, Json(json!(result))).into_response(),
            }
        }
    }

    #[derive(Debug)]
    pub enum Error {
        MissingFile,
        UnsupportedFileType,
        FileTooLarge,
        ConversionFailed(String),
        Internal,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::MissingFile => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "No image file provided. Please upload an image using the \"image\" field."
                    })),
                )
                    .into_response(),
                Self::UnsupportedFileType => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Only image files are allowed!" })),
                )
                    .into_response(),
                Self::FileTooLarge => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "File too large. Maximum size is 10MB." })),
                )
                    .into_response(),
                Self::ConversionFailed(details) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to convert image",
                        "details": details
                    })),
                )
                    .into_response(),
                Self::Internal => crate::utils::errors::internal_server_error(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
