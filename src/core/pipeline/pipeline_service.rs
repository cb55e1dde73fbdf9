// The pipeline service strings the stages together. Like the other core
// services it has no idea where images come from or where the results go:
// it takes paths in and hands plain values back.

use super::artifact_extractor::ArtifactExtractor;
use super::artifact_recognizer::ArtifactRecognizer;
use super::format_normalizer::FormatNormalizer;
use super::narration_composer::NarrationComposer;
use super::pipeline_models::{Finding, PipelineOutput};
use crate::core::ai::AiProvider;
use std::path::PathBuf;

/// Narration used when no image could be analyzed.
pub const NO_FINDINGS_NARRATION: &str = "Unable to analyze any images.";

pub struct PipelineService<P: AiProvider> {
    normalizer: FormatNormalizer,
    recognizer: ArtifactRecognizer<P>,
    extractor: ArtifactExtractor<P>,
    composer: NarrationComposer,
}

impl<P: AiProvider + Clone + 'static> PipelineService<P> {
    /// Wires every stage to the same model provider.
    pub fn new(normalizer: FormatNormalizer, provider: P, model: &str) -> Self {
        Self {
            normalizer,
            recognizer: ArtifactRecognizer::new(provider.clone(), model),
            extractor: ArtifactExtractor::new(provider.clone(), model),
            composer: NarrationComposer::new(provider, model),
        }
    }
}

impl<P: AiProvider> PipelineService<P> {
    /// Runs every image through the stages, one after another.
    ///
    /// Images the model could not analyze still appear in
    /// `normalized_paths` so the slideshow can show them.
    pub async fn run(&self, image_paths: &[PathBuf]) -> PipelineOutput {
        println!("\nAnalyzing {} image(s)...", image_paths.len());

        let mut normalized_paths = Vec::with_capacity(image_paths.len());
        let mut findings: Vec<Finding> = Vec::new();

        for (i, path) in image_paths.iter().enumerate() {
            let image = self.normalizer.normalize(path).await;
            println!(
                "  Processing image {}/{}: {}",
                i + 1,
                image_paths.len(),
                image.file_name()
            );

            match self.recognizer.recognize(&image).await {
                Ok(finding) => findings.push(finding),
                Err(e) => tracing::error!("Error analyzing image {}: {}", path.display(), e),
            }

            normalized_paths.push(image.into_path());
        }

        if findings.is_empty() {
            tracing::warn!("No image produced a finding");
            return PipelineOutput {
                narration: NO_FINDINGS_NARRATION.to_string(),
                normalized_paths,
                artifacts: Vec::new(),
                analyzed_count: 0,
            };
        }

        tracing::info!(
            analyzed = findings.len(),
            total = image_paths.len(),
            "Recognition finished"
        );

        let artifacts = self.extractor.extract(&findings).await;
        let narration = self.composer.compose(&findings).await;

        PipelineOutput {
            narration,
            normalized_paths,
            artifacts,
            analyzed_count: findings.len(),
        }
    }
}
