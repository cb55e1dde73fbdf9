// Google Drive v3 REST client.
//
// Only the two calls the survey needs: list a folder, download a file.
// See: https://developers.google.com/drive/api/reference/rest/v3/files

use super::google_auth::GoogleAuth;
use crate::core::drive::{DriveError, DriveFile, DriveSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const LIST_FIELDS: &str = "files(id,name,createdTime,modifiedTime,mimeType,size)";
const LIST_ORDER: &str = "modifiedTime desc,createdTime desc";
const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct GoogleDriveClient {
    client: Client,
    auth: GoogleAuth,
}

impl GoogleDriveClient {
    pub fn new(auth: GoogleAuth) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    fn folder_query(folder_id: &str) -> String {
        // Single quotes inside the id would end the literal early.
        let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{}' in parents and trashed=false", escaped)
    }

    async fn bearer(&self) -> Result<String, DriveError> {
        self.auth
            .get_access_token()
            .await
            .map(|token| format!("Bearer {}", token))
            .map_err(|e| DriveError::Auth(e.to_string()))
    }
}

fn api_error(e: reqwest::Error) -> DriveError {
    DriveError::Api(e.to_string())
}

#[async_trait]
impl DriveSource for GoogleDriveClient {
    async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveError> {
        let url = format!("{}/files", DRIVE_API_BASE);
        let query = Self::folder_query(folder_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer().await?)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", PAGE_SIZE),
                ("fields", LIST_FIELDS),
                ("orderBy", LIST_ORDER),
            ])
            .send()
            .await
            .map_err(api_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DriveError::Api(format!(
                "listing folder {} failed ({}): {}",
                folder_id, status, text
            )));
        }

        let list: FileList = response.json().await.map_err(api_error)?;
        Ok(list.files)
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), DriveError> {
        let url = format!("{}/files/{}", DRIVE_API_BASE, file_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer().await?)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(api_error)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(DriveError::Api(format!(
                "download of {} failed ({})",
                file_id, status
            )));
        }

        let bytes = response.bytes().await.map_err(api_error)?;
        tokio::fs::write(dest, &bytes).await?;
        tracing::debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }
}
