use super::routes::convert::types::response::Error;
use crate::types::{Context, UploadContext};
use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRef, FromRequest, Multipart, Request},
    http::StatusCode,
};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;

const DEFAULT_MIME_TYPE: &str = "text/plain";

#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub size: usize,
}

pub struct UploadPolicy<'a> {
    mime_types: &'a [String],
    extensions: &'a [String],
}

impl<'a> UploadPolicy<'a> {
    pub fn new(cfg: &'a UploadContext) -> Self {
        Self {
            mime_types: &cfg.allowed_mime_types,
            extensions: &cfg.allowed_extensions,
        }
    }

    /// Client metadata is only a hint: either an image-looking MIME type or an
    /// image-looking extension is enough.
    pub fn accepts(&self, mime_type: &str, file_name: &str) -> bool {
        self.is_image_mime(mime_type) || self.is_image_extension(file_name)
    }

    fn is_image_mime(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.to_lowercase();
        mime_type.starts_with("image/") || self.mime_types.contains(&mime_type)
    }

    fn is_image_extension(&self, file_name: &str) -> bool {
        file_extension(file_name)
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false)
    }
}

/// Lowercased text from the last `.` on, dot included.
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
}

fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// The single file part of a `multipart/form-data` body, buffered in memory.
pub struct Upload(pub UploadedImage);

#[async_trait]
impl<S> FromRequest<S> for Upload
where
    S: Send + Sync,
    Arc<Context>: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = Arc::<Context>::from_ref(state);

        let mut multipart = match Multipart::from_request(req, state).await {
            Ok(multipart) => multipart,
            Err(err) => {
                tracing::warn!("Request is not a multipart upload: {}", err);
                return Err(Error::MissingFile);
            }
        };

        let upload = read_upload(&mut multipart, &ctx.upload).await;

        // the response must not go out before the client finished sending
        drain(&mut multipart).await;

        upload.map(Self)
    }
}

async fn read_upload(
    multipart: &mut Multipart,
    cfg: &UploadContext,
) -> Result<UploadedImage, Error> {
    let policy = UploadPolicy::new(cfg);
    let mut upload = None;

    while let Some(mut field) = multipart.next_field().await.map_err(classify)? {
        if field.name() != Some(cfg.field_name.as_str()) {
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        if upload.is_some() {
            tracing::warn!(
                "Rejected upload: more than one file in field {}",
                cfg.field_name
            );
            return Err(Error::Internal);
        }

        let mime_type = field
            .content_type()
            .map(mime_essence)
            .filter(|mime| !mime.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        if !policy.accepts(&mime_type, &file_name) {
            tracing::warn!("Rejected upload {} ({}): not an image", file_name, mime_type);
            return Err(Error::UnsupportedFileType);
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(classify)? {
            if buf.len() + chunk.len() > cfg.max_file_size {
                tracing::warn!(
                    "Rejected upload {} ({}): exceeds {} bytes",
                    file_name,
                    mime_type,
                    cfg.max_file_size
                );
                return Err(Error::FileTooLarge);
            }
            buf.extend_from_slice(&chunk);
        }

        let bytes = buf.freeze();
        upload = Some(UploadedImage {
            size: bytes.len(),
            bytes,
            mime_type,
            file_name,
        });
    }

    upload.ok_or(Error::MissingFile)
}

async fn drain(multipart: &mut Multipart) {
    while let Ok(Some(_field)) = multipart.next_field().await {}
}

fn classify(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload body exceeds the request size limit");
        return Error::FileTooLarge;
    }

    tracing::error!("Malformed multipart body: {}", err.body_text());
    Error::Internal
}
