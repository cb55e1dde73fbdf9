pub mod artifact_extractor;
pub mod artifact_recognizer;
pub mod fallback;
pub mod format_normalizer;
pub mod narration_composer;
pub mod pipeline_models;
pub mod pipeline_service;
pub mod prompts;

pub use fallback::{FallbackChain, FallibleStrategy, StrategyError};
pub use format_normalizer::FormatNormalizer;
pub use pipeline_models::ImageRef;
pub use pipeline_service::PipelineService;
