/// Storage prefix for every attendance image
pub const UPLOAD_TO: &str = "attendance_images";

/// Maximum length of an uploaded filename
pub const MAX_IMG_NAME_LENGTH: usize = 100;

/// Width of the `attendance.img` column; stored names are shortened to fit
pub const MAX_STORED_NAME_LENGTH: usize = 100;

/// Default maximum upload size in bytes (10MB)
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Extra body allowance on top of the file size for multipart framing
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;
