//! Attendance image records.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/attendance/` | No | List all records |
//! | POST | `/api/attendance/` | No | Upload an image (`img`) and create a record |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgAttendanceRepository;
pub use routes::routes;
pub use services::AttendanceService;
