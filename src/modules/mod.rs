//! Infrastructure adapters
//!
//! Contains the media storage backends used for uploaded files.

pub mod storage;
