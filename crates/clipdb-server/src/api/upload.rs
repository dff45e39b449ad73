//! Multipart ingestion limits for the vision endpoints.

use std::collections::HashMap;

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;

use super::ApiError;

pub(super) const MAX_IMAGES: usize = 10;
pub(super) const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub(super) const MAX_VIDEO_BYTES: usize = 100 * 1024 * 1024;

// Room for multipart framing and the text fields.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;
pub(super) const IMAGES_BODY_LIMIT: usize = MAX_IMAGES * MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES;
pub(super) const VIDEO_BODY_LIMIT: usize = MAX_VIDEO_BYTES + FORM_OVERHEAD_BYTES;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub(super) struct ImageForm {
    pub images: Vec<Vec<u8>>,
    pub fields: HashMap<String, String>,
}

pub(super) struct VideoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn is_image_field(name: &str) -> bool {
    matches!(name, "images" | "images[]")
}

fn is_allowed_image_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| IMAGE_TYPES.contains(&ct))
}

fn is_allowed_video_type(content_type: Option<&str>) -> bool {
    content_type.is_none_or(|ct| ct.starts_with("video/") || ct == "application/octet-stream")
}

fn multipart_error(rid: &str, error: &MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(rid, "payload_too_large", "request body too large");
    }
    ApiError::new(rid, "bad_request", format!("invalid multipart body: {error}"))
}

async fn read_limited(
    field: Field<'_>,
    limit: usize,
    what: &str,
    rid: &str,
) -> Result<Vec<u8>, ApiError> {
    let bytes = field.bytes().await.map_err(|e| multipart_error(rid, &e))?;
    if bytes.len() > limit {
        return Err(ApiError::new(
            rid,
            "payload_too_large",
            format!("{what} exceeds {} MB", limit / (1024 * 1024)),
        ));
    }
    Ok(bytes.to_vec())
}

/// Reads up to [`MAX_IMAGES`] JPEG/PNG/WebP images from `images` fields plus
/// any text fields.
pub(super) async fn read_image_form(
    mut multipart: Multipart,
    rid: &str,
) -> Result<ImageForm, ApiError> {
    let mut form = ImageForm {
        images: Vec::new(),
        fields: HashMap::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(rid, &e))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if is_image_field(&name) {
            if !is_allowed_image_type(field.content_type()) {
                return Err(ApiError::new(
                    rid,
                    "unsupported_media_type",
                    "images must be JPEG, PNG or WebP",
                ));
            }
            if form.images.len() == MAX_IMAGES {
                return Err(ApiError::new(
                    rid,
                    "validation_error",
                    format!("at most {MAX_IMAGES} images per request"),
                ));
            }
            form.images
                .push(read_limited(field, MAX_IMAGE_BYTES, "image", rid).await?);
        } else if !name.is_empty() {
            let value = field.text().await.map_err(|e| multipart_error(rid, &e))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Reads the single `video` field.
pub(super) async fn read_video(mut multipart: Multipart, rid: &str) -> Result<VideoUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(rid, &e))?
    {
        if field.name() != Some("video") {
            continue;
        }
        if !is_allowed_video_type(field.content_type()) {
            return Err(ApiError::new(
                rid,
                "unsupported_media_type",
                "video field must carry a video/* content type",
            ));
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("upload.mp4")
            .to_owned();
        let bytes = read_limited(field, MAX_VIDEO_BYTES, "video", rid).await?;
        if bytes.is_empty() {
            return Err(ApiError::new(rid, "validation_error", "video is empty"));
        }
        return Ok(VideoUpload { file_name, bytes });
    }

    Err(ApiError::new(rid, "validation_error", "missing video field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_types_are_restricted() {
        assert!(is_allowed_image_type(Some("image/png")));
        assert!(is_allowed_image_type(Some("image/webp")));
        assert!(!is_allowed_image_type(Some("image/gif")));
        assert!(!is_allowed_image_type(None));
    }

    #[test]
    fn video_types_allow_missing_content_type() {
        assert!(is_allowed_video_type(None));
        assert!(is_allowed_video_type(Some("video/quicktime")));
        assert!(is_allowed_video_type(Some("application/octet-stream")));
        assert!(!is_allowed_video_type(Some("text/plain")));
    }

    #[test]
    fn body_limits_cover_the_per_file_caps() {
        assert!(IMAGES_BODY_LIMIT > MAX_IMAGES * MAX_IMAGE_BYTES);
        assert!(VIDEO_BODY_LIMIT > MAX_VIDEO_BYTES);
    }

    #[test]
    fn both_image_field_spellings_are_accepted() {
        assert!(is_image_field("images"));
        assert!(is_image_field("images[]"));
        assert!(!is_image_field("image"));
    }
}
