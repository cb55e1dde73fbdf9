use chrono::{DateTime, Utc};
use serde::Deserialize;

/// File extensions treated as images even when the MIME type says otherwise.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "gif", "bmp", "webp"];

/// Metadata for one file in a drive folder.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mime_type: String,
    /// Drive reports sizes as decimal strings.
    #[serde(default)]
    pub size: Option<String>,
}

impl DriveFile {
    pub fn is_image(&self) -> bool {
        let lower = self.name.to_lowercase();
        let by_extension = lower
            .rsplit_once('.')
            .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        by_extension || self.mime_type.starts_with("image/")
    }

    /// Modified time, falling back to created time.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.modified_time.or(self.created_time)
    }
}
