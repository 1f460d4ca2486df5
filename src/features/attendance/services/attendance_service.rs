use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::attendance::dtos::{
    storage_name_error, AttendanceResponseDto, UploadedImage,
};
use crate::features::attendance::models::Attendance;
use crate::features::attendance::repositories::AttendanceRepository;
use crate::modules::storage::MediaStorage;
use crate::shared::constants::MAX_STORED_NAME_LENGTH;

/// Translates between attendance records and their wire representation,
/// and owns the create/update flows that touch both the record store and
/// the media storage.
pub struct AttendanceService {
    repository: Arc<dyn AttendanceRepository>,
    storage: Arc<dyn MediaStorage>,
}

impl AttendanceService {
    pub fn new(repository: Arc<dyn AttendanceRepository>, storage: Arc<dyn MediaStorage>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    /// Serialize a record for the API
    pub fn to_dto(&self, record: Attendance) -> AttendanceResponseDto {
        AttendanceResponseDto {
            id: record.id,
            img: self.storage.url(&record.img),
            created_at: record.created_at,
        }
    }

    /// List every record in insertion order
    pub async fn list(&self) -> Result<Vec<AttendanceResponseDto>> {
        let records = self.repository.list().await?;
        debug!("Listing {} attendance records", records.len());
        Ok(records.into_iter().map(|r| self.to_dto(r)).collect())
    }

    /// Store the image and create a record pointing at it
    pub async fn create(&self, image: UploadedImage) -> Result<AttendanceResponseDto> {
        let name = self.store_image(&image).await?;

        let record = match self.repository.insert(&name).await {
            Ok(record) => record,
            Err(e) => {
                // Do not leave an orphaned file behind
                if let Err(cleanup) = self.storage.delete(&name).await {
                    warn!("Failed to remove orphaned media '{}': {}", name, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            "Attendance record created: id={}, img={}, size={}",
            record.id,
            record.img,
            image.data.len()
        );

        Ok(self.to_dto(record))
    }

    /// Replace the image of an existing record, or re-persist it unchanged
    /// when no new image is given.
    #[allow(dead_code)]
    pub async fn update(&self, id: i64, image: Option<UploadedImage>) -> Result<AttendanceResponseDto> {
        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attendance record {} not found", id)))?;

        let img = match image {
            Some(image) => self.store_image(&image).await?,
            None => existing.img,
        };

        let record = self.repository.update_img(id, &img).await?;
        info!("Attendance record updated: id={}, img={}", record.id, record.img);

        Ok(self.to_dto(record))
    }

    async fn store_image(&self, image: &UploadedImage) -> Result<String> {
        let requested = image
            .storage_name()
            .ok_or_else(|| AppError::Validation(storage_name_error()))?;

        self.storage
            .save(
                &requested,
                image.data.clone(),
                &image.content_type,
                MAX_STORED_NAME_LENGTH,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        jpeg_image, test_service, FailingAttendanceRepository, InMemoryAttendanceRepository,
    };
    use crate::core::error::field_errors;
    use crate::modules::storage::LocalMediaStorage;
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_assigns_id_timestamp_and_url() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        let before = Utc::now();
        let dto = service.create(jpeg_image("photo.jpg")).await.unwrap();
        let after = Utc::now();

        assert_eq!(dto.id, 1);
        assert_eq!(
            dto.img,
            "http://localhost:8000/media/attendance_images/photo.jpg"
        );
        assert!(dto.created_at >= before && dto.created_at <= after);
        assert!(tmp.path().join("attendance_images/photo.jpg").is_file());
    }

    #[tokio::test]
    async fn test_create_is_not_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        let first = service.create(jpeg_image("photo.jpg")).await.unwrap();
        let second = service.create(jpeg_image("photo.jpg")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.img, second.img);
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_sanitizes_filename() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        let dto = service
            .create(jpeg_image("../secret dir/my photo.jpg"))
            .await
            .unwrap();

        assert!(dto.img.ends_with("/media/attendance_images/my_photo.jpg"));
    }

    #[tokio::test]
    async fn test_create_keeps_stored_name_within_column_width() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());
        let name = format!("{}.jpg", "a".repeat(96));

        let first = service.create(jpeg_image(&name)).await.unwrap();
        let second = service.create(jpeg_image(&name)).await.unwrap();

        for dto in [&first, &second] {
            let stored = dto
                .img
                .strip_prefix("http://localhost:8000/media/")
                .unwrap();
            assert!(stored.chars().count() <= MAX_STORED_NAME_LENGTH);
            assert!(stored.ends_with(".jpg"));
            assert!(tmp.path().join(stored).is_file());
        }
        assert_ne!(first.img, second.img);
    }

    #[tokio::test]
    async fn test_create_unusable_filename_is_field_error() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        let err = service.create(jpeg_image("???")).await.unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert!(field_errors(&errors).contains_key("img"));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_removes_file_when_insert_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalMediaStorage::new(tmp.path(), "http://localhost:8000/media/"));
        let service = AttendanceService::new(Arc::new(FailingAttendanceRepository), storage);

        let err = service.create(jpeg_image("photo.jpg")).await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert!(!tmp.path().join("attendance_images/photo.jpg").exists());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            service.create(jpeg_image(name)).await.unwrap();
        }

        let ids: Vec<i64> = service.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_replaces_image() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        let created = service.create(jpeg_image("old.jpg")).await.unwrap();
        let updated = service
            .update(created.id, Some(jpeg_image("new.jpg")))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.img.ends_with("attendance_images/new.jpg"));
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let service = test_service(tmp.path());

        let created = service.create(jpeg_image("keep.jpg")).await.unwrap();
        let updated = service.update(created.id, None).await.unwrap();

        assert_eq!(updated.img, created.img);
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let tmp = tempfile::tempdir().unwrap();
        let repository = Arc::new(InMemoryAttendanceRepository::default());
        let storage = Arc::new(LocalMediaStorage::new(tmp.path(), "http://localhost:8000/media/"));
        let service = AttendanceService::new(repository, storage);

        let err = service.update(42, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
