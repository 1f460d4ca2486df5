use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use crate::features::attendance::handlers::{create_attendance, list_attendance};
use crate::features::attendance::services::AttendanceService;
use crate::shared::constants::MULTIPART_OVERHEAD;

/// Create routes for the attendance feature
pub fn routes(attendance_service: Arc<AttendanceService>, max_upload_size: usize) -> Router {
    let resource = get(list_attendance)
        .post(create_attendance)
        .layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD));

    Router::new()
        .route("/api/attendance/", resource.clone())
        .route("/api/attendance", resource)
        .with_state(attendance_service)
}
