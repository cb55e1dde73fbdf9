// Builds the single-file slideshow: every image and the narration audio are
// embedded as base64 so the HTML can be copied around on its own.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TEMPLATE: &str = include_str!("presentation.html");

#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("Failed to write presentation: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode slides: {0}")]
    Json(#[from] serde_json::Error),
}

/// One embedded image as the page script expects it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Slide {
    pub data: String,
    pub mime: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedAudio {
    pub data: String,
    pub mime: String,
}

fn lower_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

pub fn image_mime(path: &Path) -> &'static str {
    match lower_extension(path).as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

pub fn audio_mime(path: &Path) -> &'static str {
    match lower_extension(path).as_str() {
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        _ => "audio/mpeg",
    }
}

/// Fills the HTML template. No I/O.
pub fn render_html(slides: &[Slide], audio: Option<&EmbeddedAudio>) -> Result<String, PresentationError> {
    // A file name containing "</script>" must not end the script block early.
    let images_json = serde_json::to_string(slides)?.replace("</", "<\\/");
    let (audio_mime, audio_data) = match audio {
        Some(a) => (a.mime.as_str(), a.data.as_str()),
        None => ("audio/mpeg", ""),
    };

    Ok(TEMPLATE
        .replace("{{AUDIO_MIME}}", audio_mime)
        .replace("{{AUDIO_DATA}}", audio_data)
        .replace("{{SLIDE_COUNT}}", &slides.len().to_string())
        .replace("{{IMAGES_JSON}}", &images_json))
}

/// Reads images and audio from disk and writes the presentation to `output_path`.
///
/// Missing images are skipped. A missing audio file only produces a warning;
/// the page is still written with an empty player.
pub async fn create_presentation(
    image_paths: &[PathBuf],
    audio_path: &Path,
    output_path: &Path,
) -> Result<PathBuf, PresentationError> {
    let mut slides = Vec::with_capacity(image_paths.len());
    for path in image_paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => slides.push(Slide {
                data: STANDARD.encode(&bytes),
                mime: image_mime(path).to_string(),
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }),
            Err(e) => tracing::warn!("Skipping image {}: {}", path.display(), e),
        }
    }

    let audio = match tokio::fs::read(audio_path).await {
        Ok(bytes) => Some(EmbeddedAudio {
            data: STANDARD.encode(&bytes),
            mime: audio_mime(audio_path).to_string(),
        }),
        Err(_) => {
            tracing::warn!(
                "Audio file not found: {}. Presentation will be created without audio",
                audio_path.display()
            );
            None
        }
    };

    let html = render_html(&slides, audio.as_ref())?;
    tokio::fs::write(output_path, html).await?;

    tracing::info!(
        slides = slides.len(),
        "Created presentation: {}",
        output_path.display()
    );
    Ok(output_path.to_path_buf())
}
