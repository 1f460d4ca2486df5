mod attendance;

pub use attendance::Attendance;
