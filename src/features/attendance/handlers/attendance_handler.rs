use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AttendanceForm;
use crate::features::attendance::dtos::{AttendanceResponseDto, UploadAttendanceDto};
use crate::features::attendance::services::AttendanceService;

/// List attendance records
///
/// Returns every stored record in insertion order. No filtering or pagination.
#[utoipa::path(
    get,
    path = "/api/attendance/",
    tag = "attendance",
    responses(
        (status = 200, description = "All attendance records", body = Vec<AttendanceResponseDto>)
    )
)]
pub async fn list_attendance(
    State(service): State<Arc<AttendanceService>>,
) -> Result<Json<Vec<AttendanceResponseDto>>, AppError> {
    let records = service.list().await?;
    Ok(Json(records))
}

/// Create an attendance record
///
/// Accepts multipart/form-data with:
/// - `img`: The image file (required)
#[utoipa::path(
    post,
    path = "/api/attendance/",
    tag = "attendance",
    request_body(
        content = UploadAttendanceDto,
        content_type = "multipart/form-data",
        description = "Attendance image upload",
    ),
    responses(
        (status = 200, description = "Attendance record created", body = AttendanceResponseDto),
        (status = 400, description = "Field errors keyed by field name, e.g. {\"img\": [\"No file was submitted.\"]}"),
        (status = 413, description = "Image too large"),
        (status = 415, description = "Unsupported content type")
    )
)]
pub async fn create_attendance(
    State(service): State<Arc<AttendanceService>>,
    AttendanceForm(form): AttendanceForm,
) -> Result<Json<AttendanceResponseDto>, AppError> {
    form.validate()?;

    let image = form
        .img
        .ok_or_else(|| AppError::Internal("Validated upload without image".to_string()))?;

    let record = service.create(image).await?;

    Ok(Json(record))
}
