//! Typed access to the HorseWatch service.
//!
//! [`ApiClient`] owns a [`Transport`] and turns raw HTTP exchanges into typed
//! results; the entity modules add one method per endpoint on top of it.

pub mod client;
pub mod detections;
pub mod gloo;
pub mod horses;
pub mod locations;

pub use client::{ApiClient, FormPart, HttpRequest, HttpResponse, Method, RequestBody, Transport};
pub use gloo::GlooTransport;

pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_CONFLICT: u16 = 409;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// A client-side precondition failed; nothing was sent.
    #[error("{0}")]
    Validation(String),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("{detail}")]
    Remote { status: u16, detail: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The service refused because of related records, e.g. deleting a
    /// location that still owns detections.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(HTTP_CONFLICT)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(HTTP_NOT_FOUND)
    }
}

/// An image picked by the user, ready to be sent as a multipart file field.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn into_part(self, field: &str) -> FormPart {
        FormPart::File {
            name: field.to_string(),
            file_name: self.file_name,
            mime_type: self.mime_type,
            bytes: self.bytes,
        }
    }
}

fn required_text(value: &str, message: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn required_image(image: ImageUpload, message: &str) -> Result<ImageUpload, ApiError> {
    if image.is_empty() {
        return Err(ApiError::Validation(message.to_string()));
    }
    Ok(image)
}
