//! Image upload extractor accepting multipart forms or raw image bodies

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use bytes::Bytes;

use crate::api::types::ApiError;
use crate::domain::DomainError;

/// Form field carrying the image in multipart uploads
pub const FILE_FIELD: &str = "file";

/// Detail returned when the declared type is not an image
pub const INVALID_FILE_TYPE: &str = "Invalid file type. Please upload an image.";

/// An uploaded file with its declared content type
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Only the declared content type is checked; the bytes are decoded later
    pub fn ensure_image(&self) -> Result<(), DomainError> {
        let is_image = self
            .content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);

        if is_image {
            Ok(())
        } else {
            Err(DomainError::invalid_input(INVALID_FILE_TYPE))
        }
    }
}

impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let is_multipart = content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let bytes = Bytes::from_request(req, state).await?;
            return Ok(Self {
                file_name: None,
                content_type,
                bytes,
            });
        }

        let mut multipart = Multipart::from_request(req, state).await?;
        // First other part with a filename, used only when no `file` field is sent
        let mut fallback: Option<Self> = None;

        while let Some(field) = multipart.next_field().await? {
            let is_file_field = field.name() == Some(FILE_FIELD);
            if !is_file_field && (fallback.is_some() || field.file_name().is_none()) {
                continue;
            }

            let upload = Self {
                file_name: field.file_name().map(|s| s.to_string()),
                content_type: field.content_type().map(|s| s.to_string()),
                bytes: field.bytes().await?,
            };

            if is_file_field {
                return Ok(upload);
            }
            fallback = Some(upload);
        }

        fallback.ok_or_else(|| ApiError::bad_request("No file uploaded"))
    }
}
