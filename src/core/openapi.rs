use utoipa::{Modify, OpenApi};

use crate::features::attendance::{dtos as attendance_dtos, handlers as attendance_handlers};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        attendance_handlers::list_attendance,
        attendance_handlers::create_attendance,
    ),
    components(
        schemas(
            ErrorResponse,
            attendance_dtos::AttendanceResponseDto,
            attendance_dtos::UploadAttendanceDto,
        )
    ),
    tags(
        (name = "attendance", description = "Attendance image records"),
    ),
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = "API documentation for the attendance image service",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_attendance_resource() {
        let openapi = ApiDoc::openapi();
        let item = openapi
            .paths
            .paths
            .get("/api/attendance/")
            .expect("attendance path documented");

        assert!(item.get.is_some());
        assert!(item.post.is_some());
    }

    #[test]
    fn test_swagger_info_modifier_overrides_info() {
        let mut openapi = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "Custom docs".to_string(),
        }
        .modify(&mut openapi);

        assert_eq!(openapi.info.title, "Custom");
        assert_eq!(openapi.info.version, "9.9.9");
        assert_eq!(openapi.info.description.as_deref(), Some("Custom docs"));
    }
}
