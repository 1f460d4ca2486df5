use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for attendance records
#[derive(Debug, Clone, FromRow)]
pub struct Attendance {
    pub id: i64,
    /// Storage name of the image, e.g. `attendance_images/photo.jpg`
    pub img: String,
    pub created_at: DateTime<Utc>,
}
