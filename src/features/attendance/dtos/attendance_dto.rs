use std::borrow::Cow;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::modules::storage::{get_valid_filename, is_storable};
use crate::shared::constants::{MAX_IMG_NAME_LENGTH, MAX_STORED_NAME_LENGTH, UPLOAD_TO};

/// Response DTO for an attendance record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponseDto {
    /// Record identifier, assigned on creation
    #[schema(example = 1)]
    pub id: i64,
    /// URL of the stored image
    #[schema(example = "http://127.0.0.1:8000/media/attendance_images/photo.jpg")]
    pub img: String,
    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,
}

/// Upload attendance request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses the `AttendanceForm` extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadAttendanceDto {
    /// The image to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub img: String,
}

/// An `img` part as received from the multipart body
#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    /// `None` when the part was a plain form value rather than a file
    pub file_name: Option<String>,
    /// Declared content type, or one inferred from the file extension
    pub content_type: String,
    #[serde(skip)]
    pub data: Bytes,
}

impl UploadedImage {
    /// Requested storage name, `attendance_images/<sanitized filename>`.
    /// `None` when nothing usable is left of the filename.
    pub fn storage_name(&self) -> Option<String> {
        let file_name = get_valid_filename(self.file_name.as_deref()?);
        if file_name.is_empty() {
            return None;
        }
        Some(format!("{}/{}", UPLOAD_TO, file_name))
    }
}

/// Parsed and not yet validated upload form
#[derive(Debug, Default, Validate)]
pub struct AttendanceUploadDto {
    #[validate(
        required(message = "No file was submitted."),
        custom(function = "validate_image_file")
    )]
    pub img: Option<UploadedImage>,
}

/// Image MIME types accepted for attendance uploads
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

/// Check if a MIME type is an accepted image type
pub fn is_image_type_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// Guess the content type from a filename extension
pub fn get_content_type_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Pick the effective content type of an upload.
///
/// The declared type wins unless it is missing or the generic
/// `application/octet-stream`, in which case the extension decides.
pub fn resolve_content_type(declared: Option<&str>, file_name: Option<&str>) -> String {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match declared {
        Some(ct) => ct,
        None => file_name
            .and_then(get_content_type_from_extension)
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

fn image_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

const NO_STORAGE_NAME: &str = "Could not derive a file name from the submitted filename.";

/// `{"img": [...]}` error for an upload whose name cannot be stored
pub fn storage_name_error() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add("img", image_error("invalid_name", NO_STORAGE_NAME));
    errors
}

fn validate_image_file(img: &UploadedImage) -> Result<(), ValidationError> {
    let file_name = img.file_name.as_deref().ok_or_else(|| {
        image_error(
            "invalid",
            "The submitted data was not a file. Check the encoding type on the form.",
        )
    })?;

    if file_name.is_empty() {
        return Err(image_error("no_name", "No filename could be determined."));
    }

    if img.data.is_empty() {
        return Err(image_error("empty", "The submitted file is empty."));
    }

    let length = file_name.chars().count();
    if length > MAX_IMG_NAME_LENGTH {
        return Err(image_error(
            "max_length",
            format!(
                "Ensure this filename has at most {} characters (it has {}).",
                MAX_IMG_NAME_LENGTH, length
            ),
        ));
    }

    let storable = img
        .storage_name()
        .is_some_and(|name| is_storable(&name, MAX_STORED_NAME_LENGTH));
    if !storable {
        return Err(image_error("invalid_name", NO_STORAGE_NAME));
    }

    if !is_image_type_allowed(&img.content_type) {
        return Err(image_error(
            "invalid_image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        ));
    }

    Ok(())
}
