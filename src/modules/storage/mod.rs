//! Storage module for uploaded media
//!
//! Provides the `MediaStorage` abstraction with a local filesystem
//! backend and a MinIO/S3-compatible backend.

mod local;
mod minio;

pub use local::LocalMediaStorage;
pub use minio::MinIOMediaStorage;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::core::error::AppError;

/// Attempts at finding a free name before giving up
const MAX_NAME_ATTEMPTS: usize = 16;

/// Length of the random suffix appended to a taken name
const NAME_SUFFIX_LENGTH: usize = 7;

/// A store for uploaded files, addressed by relative names such as
/// `attendance_images/photo.jpg`.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Write a new file. Never overwrites: when `name` is taken an
    /// alternative is chosen. The written name has at most `max_length`
    /// characters and is returned.
    async fn save(
        &self,
        name: &str,
        data: Bytes,
        content_type: &str,
        max_length: usize,
    ) -> Result<String, AppError>;

    /// Delete a file. No-op if absent.
    async fn delete(&self, name: &str) -> Result<(), AppError>;

    /// Public URL for a stored name
    fn url(&self, name: &str) -> String;
}

/// Reduce an uploaded filename to a safe storage filename.
///
/// Keeps only the last path component, turns spaces into underscores and
/// drops anything that is not alphanumeric, `-`, `_` or `.`.
pub fn get_valid_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");
    base.trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Split `dir/stem.ext` into `("dir/", "stem", ".ext")`
fn split_name(name: &str) -> (&str, &str, &str) {
    let (dir, file) = match name.rfind('/') {
        Some(idx) => (&name[..=idx], &name[idx + 1..]),
        None => ("", name),
    };
    match file.rfind('.') {
        Some(idx) if idx > 0 => (dir, &file[..idx], &file[idx..]),
        _ => (dir, file, ""),
    }
}

/// Rebuild `name` with `insert` after its stem, cutting the stem so the
/// result has at most `max_length` characters. `None` if no stem is left.
fn fit_name(name: &str, insert: &str, max_length: usize) -> Option<String> {
    let (dir, stem, ext) = split_name(name);
    let fixed = dir.chars().count() + insert.chars().count() + ext.chars().count();
    let room = max_length.checked_sub(fixed)?;
    let stem: String = stem.chars().take(room).collect();
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}{}{}{}", dir, stem, insert, ext))
}

/// Shorten the file stem of `name` to fit in `max_length` characters
pub fn truncate_name(name: &str, max_length: usize) -> Option<String> {
    fit_name(name, "", max_length)
}

/// Build an alternative for a taken name by suffixing the file stem:
/// `dir/photo.jpg` -> `dir/photo_a1b2c3d.jpg`. The stem is cut when the
/// result would exceed `max_length`.
pub fn alternative_name(name: &str, max_length: usize) -> Option<String> {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(NAME_SUFFIX_LENGTH)
        .collect();
    fit_name(name, &format!("_{}", suffix), max_length)
}

/// Whether `name` and any alternative of it fit in `max_length` characters
pub fn is_storable(name: &str, max_length: usize) -> bool {
    let placeholder = "_".repeat(NAME_SUFFIX_LENGTH + 1);
    fit_name(name, &placeholder, max_length).is_some()
}

fn no_room_error(name: &str, max_length: usize) -> AppError {
    AppError::Internal(format!(
        "Name '{}' cannot be shortened to {} characters",
        name, max_length
    ))
}

/// Reject names that could escape the storage root
fn ensure_relative(name: &str) -> Result<(), AppError> {
    if name.is_empty()
        || name.starts_with('/')
        || name.starts_with('\\')
        || name.split(['/', '\\']).any(|part| part == "..")
    {
        return Err(AppError::Internal(format!("Invalid storage name '{}'", name)));
    }
    Ok(())
}
