pub mod drive_models;
pub mod drive_service;

pub use drive_models::DriveFile;
pub use drive_service::{DriveError, DriveService, DriveSource};
