use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::attendance::models::Attendance;

/// Persistence primitives for attendance records
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// All records in insertion order
    async fn list(&self) -> Result<Vec<Attendance>>;

    /// Insert a record; `id` and `created_at` are assigned by the store
    async fn insert(&self, img: &str) -> Result<Attendance>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Attendance>>;

    /// Overwrite the image reference of an existing record
    async fn update_img(&self, id: i64, img: &str) -> Result<Attendance>;
}

pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn list(&self) -> Result<Vec<Attendance>> {
        let records = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, img, created_at
            FROM attendance
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn insert(&self, img: &str) -> Result<Attendance> {
        let record = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendance (img)
            VALUES ($1)
            RETURNING id, img, created_at
            "#,
        )
        .bind(img)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Attendance>> {
        let record = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, img, created_at
            FROM attendance
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_img(&self, id: i64, img: &str) -> Result<Attendance> {
        let record = sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendance
            SET img = $2
            WHERE id = $1
            RETURNING id, img, created_at
            "#,
        )
        .bind(id)
        .bind(img)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}
