use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use crate::core::error::{AppError, Result};
use crate::features::attendance::dtos::UploadedImage;
use crate::features::attendance::models::Attendance;
use crate::features::attendance::repositories::AttendanceRepository;
use crate::features::attendance::{self, AttendanceService};
use crate::modules::storage::LocalMediaStorage;
use crate::shared::constants::DEFAULT_MAX_UPLOAD_SIZE;

/// Smallest byte sequence that starts like a JPEG file
pub const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\xff\xd9";

pub const TEST_BASE_URL: &str = "http://localhost:8000";

/// Record store kept in memory, assigning ids the way a sequence would
#[derive(Default)]
pub struct InMemoryAttendanceRepository {
    records: Mutex<Vec<Attendance>>,
}

#[async_trait]
impl AttendanceRepository for InMemoryAttendanceRepository {
    async fn list(&self) -> Result<Vec<Attendance>> {
        Ok(self.records.lock().await.clone())
    }

    async fn insert(&self, img: &str) -> Result<Attendance> {
        let mut records = self.records.lock().await;
        let record = Attendance {
            id: records.last().map(|r| r.id + 1).unwrap_or(1),
            img: img.to_string(),
            created_at: Utc::now(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Attendance>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update_img(&self, id: i64, img: &str) -> Result<Attendance> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Attendance record {} not found", id)))?;
        record.img = img.to_string();
        Ok(record.clone())
    }
}

/// Record store whose writes always fail
pub struct FailingAttendanceRepository;

#[async_trait]
impl AttendanceRepository for FailingAttendanceRepository {
    async fn list(&self) -> Result<Vec<Attendance>> {
        Ok(Vec::new())
    }

    async fn insert(&self, _img: &str) -> Result<Attendance> {
        Err(AppError::Internal("insert failed".to_string()))
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<Attendance>> {
        Ok(None)
    }

    async fn update_img(&self, _id: i64, _img: &str) -> Result<Attendance> {
        Err(AppError::Internal("update failed".to_string()))
    }
}

pub fn jpeg_image(file_name: &str) -> UploadedImage {
    UploadedImage {
        file_name: Some(file_name.to_string()),
        content_type: "image/jpeg".to_string(),
        data: Bytes::from_static(JPEG_BYTES),
    }
}

/// Service over an in-memory store and a local media root at `media_root`
pub fn test_service(media_root: &Path) -> AttendanceService {
    let storage = Arc::new(LocalMediaStorage::new(
        media_root,
        &format!("{}/media/", TEST_BASE_URL),
    ));
    AttendanceService::new(Arc::new(InMemoryAttendanceRepository::default()), storage)
}

/// Attendance routes plus `/media` served from `media_root`
pub fn test_server(media_root: &Path) -> TestServer {
    let service = Arc::new(test_service(media_root));
    let app = Router::new()
        .merge(attendance::routes(service, DEFAULT_MAX_UPLOAD_SIZE))
        .nest_service("/media", ServeDir::new(media_root));

    TestServer::new(app).unwrap()
}
