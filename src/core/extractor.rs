use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header, StatusCode},
};
use tracing::debug;

use crate::core::error::AppError;
use crate::features::attendance::dtos::{
    resolve_content_type, AttendanceUploadDto, UploadedImage,
};

/// Form extractor for attendance uploads.
///
/// Accepts `multipart/form-data` and `application/x-www-form-urlencoded`
/// bodies. Url-encoded forms cannot carry a file, so they always produce
/// an empty upload that fails validation with a field error. Any other
/// content type is rejected with 415.
pub struct AttendanceForm(pub AttendanceUploadDto);

impl<S> FromRequest<S> for AttendanceForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        match mime.as_str() {
            "multipart/form-data" => {
                let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                    debug!("Rejected multipart request: {}", e);
                    AppError::BadRequest(format!("Invalid multipart request: {}", e))
                })?;
                read_upload(multipart).await.map(Self)
            }
            "application/x-www-form-urlencoded" => Ok(Self(AttendanceUploadDto::default())),
            _ => Err(AppError::UnsupportedMediaType(content_type)),
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<AttendanceUploadDto, AppError> {
    let mut dto = AttendanceUploadDto::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "img" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = resolve_content_type(field.content_type(), file_name.as_deref());
                let data = field.bytes().await.map_err(multipart_error)?;

                // Last part wins when the field is repeated
                dto.img = Some(UploadedImage {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Ok(dto)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    }
}
