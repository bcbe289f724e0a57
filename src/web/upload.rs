//! Turns an uploaded photo into an [`ImageDataUri`].

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use image::ImageFormat;

use super::ApiError;
use crate::data_uri::ImageDataUri;

pub const NOT_AN_IMAGE: &str = "Please upload a valid image file (e.g., JPG, PNG, GIF).";

/// Reads the `image` field (or the first file field) of a multipart form.
pub async fn read_photo(mut multipart: Multipart) -> Result<ImageDataUri, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("unreadable form data", e))?
    {
        let is_photo = field.name() == Some("image") || field.file_name().is_some();
        if !is_photo {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error("unreadable upload", e))?;

        return photo_to_data_uri(content_type.as_deref(), &bytes)
            .ok_or_else(|| ApiError::InvalidUpload(NOT_AN_IMAGE.to_string()));
    }

    Err(ApiError::InvalidUpload(NOT_AN_IMAGE.to_string()))
}

fn upload_error(context: &str, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::InvalidUpload(format!("{context}: {err}"))
    }
}

/// A declared non-image type is rejected outright. Without a useful
/// declared type the bytes are sniffed.
pub fn photo_to_data_uri(content_type: Option<&str>, bytes: &[u8]) -> Option<ImageDataUri> {
    let declared = content_type
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value != "application/octet-stream");

    let mime = match declared {
        Some(mime) if mime.starts_with("image/") => mime,
        Some(_) => return None,
        None => sniff_mime(bytes)?.to_string(),
    };

    ImageDataUri::from_image_bytes(&mime, bytes).ok()
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let mime = match image::guess_format(bytes).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => return None,
    };
    Some(mime)
}
