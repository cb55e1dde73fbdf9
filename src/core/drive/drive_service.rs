use super::drive_models::DriveFile;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Drive authentication failed: {0}")]
    Auth(String),
    #[error("Drive API error: {0}")]
    Api(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the survey photos live.
#[async_trait]
pub trait DriveSource: Send + Sync {
    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveError>;

    /// Downloads the file's bytes to `dest`.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), DriveError>;
}

/// Picks the `count` newest images: modified time first, created time breaks ties.
pub fn select_recent_images(files: Vec<DriveFile>, count: usize) -> Vec<DriveFile> {
    let mut images: Vec<DriveFile> = files.into_iter().filter(DriveFile::is_image).collect();
    images.sort_by_key(|f| Reverse((f.latest_timestamp(), f.created_time)));
    images.truncate(count);
    images
}

pub struct DriveService<D: DriveSource> {
    source: D,
}

impl<D: DriveSource> DriveService<D> {
    pub fn new(source: D) -> Self {
        Self { source }
    }

    /// Downloads the newest images in `folder_id` into `output_dir`.
    ///
    /// A failed download is logged and skipped, so fewer than `count` paths
    /// may come back. Listing failures are errors.
    pub async fn download_recent_images(
        &self,
        folder_id: &str,
        count: usize,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, DriveError> {
        let files = self.source.list_files(folder_id).await?;
        tracing::info!("Found {} files in folder", files.len());

        let selected = select_recent_images(files, count);
        if !selected.is_empty() {
            println!(
                "  Selected {} most recent image(s) by timestamp:",
                selected.len()
            );
            for (i, file) in selected.iter().enumerate() {
                let stamp = file
                    .latest_timestamp()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "No timestamp".to_string());
                println!("    {}. {} - {}", i + 1, file.name, stamp);
            }
        }

        let mut downloaded = Vec::with_capacity(selected.len());
        let mut taken = HashSet::new();
        for file in &selected {
            let dest = output_dir.join(unique_file_name(&file.name, &file.id, &mut taken));
            match self.source.download(&file.id, &dest).await {
                Ok(()) => {
                    tracing::info!("Downloaded: {}", file.name);
                    downloaded.push(dest);
                }
                Err(e) => tracing::error!("Error downloading {}: {}", file.name, e),
            }
        }

        Ok(downloaded)
    }
}

/// Drive names may contain path separators; keep only the last component.
fn safe_file_name(name: &str, fallback: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if last.is_empty() || last == "." || last == ".." {
        fallback.to_string()
    } else {
        last.to_string()
    }
}

/// Drive allows duplicate names in one folder; a repeated name gets the file id
/// before its extension.
fn unique_file_name(name: &str, id: &str, taken: &mut HashSet<String>) -> String {
    let base = safe_file_name(name, id);
    let chosen = if taken.contains(&base) {
        let path = Path::new(&base);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(base.as_str());
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_{}.{}", stem, id, ext),
            None => format!("{}_{}", stem, id),
        }
    } else {
        base
    };
    taken.insert(chosen.clone());
    chosen
}
