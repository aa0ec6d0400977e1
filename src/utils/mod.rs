pub mod image_upload;
pub mod schedule_cache;
