use super::pipeline_models::{Finding, ImageRef};
use super::prompts::{RECOGNITION_MAX_TOKENS, RECOGNITION_SYSTEM_PROMPT, RECOGNITION_USER_PROMPT};
use crate::core::ai::{AiConfig, AiProvider, AiService, ContentPart, InlineImage, MessageContent};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Could not read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Vision model error: {0}")]
    Model(String),
}

/// Sends one image at a time to a vision model and returns what it saw.
pub struct ArtifactRecognizer<P: AiProvider> {
    ai: AiService<P>,
}

impl<P: AiProvider> ArtifactRecognizer<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        let config = AiConfig::new(model).with_max_tokens(RECOGNITION_MAX_TOKENS);
        Self {
            ai: AiService::new(provider, RECOGNITION_SYSTEM_PROMPT, config),
        }
    }

    pub async fn recognize(&self, image: &ImageRef) -> Result<Finding, RecognitionError> {
        let bytes = tokio::fs::read(image.path())
            .await
            .map_err(|source| RecognitionError::Read {
                path: image.path().display().to_string(),
                source,
            })?;

        let encoded = STANDARD.encode(&bytes);
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: RECOGNITION_USER_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: InlineImage::from_base64(image.mime_type(), &encoded),
            },
        ]);

        tracing::debug!(
            image = %image.file_name(),
            bytes = bytes.len(),
            model = %self.ai.config().model,
            "Sending image to vision model"
        );

        let analysis = self
            .ai
            .complete(content)
            .await
            .map_err(|e| RecognitionError::Model(e.to_string()))?;

        Ok(Finding::new(analysis))
    }
}
