use super::fallback::{FallbackChain, FallibleStrategy, StrategyError};
use super::pipeline_models::ImageRef;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Makes sure the image handed to the vision model is a JPEG.
///
/// JPEG inputs come back untouched without any filesystem access. Anything
/// else goes through the converter chain (native tool, decoding library, ...)
/// and the first converter that writes a `<stem>.jpg` sibling wins. When all
/// converters fail the original path is returned and downstream stages cope.
pub struct FormatNormalizer {
    converters: FallbackChain<ImageRef, PathBuf>,
}

impl FormatNormalizer {
    pub fn new(converters: FallbackChain<ImageRef, PathBuf>) -> Self {
        tracing::debug!(converters = ?converters.names(), "JPEG converters ready");
        Self {
            converters: converters.then(KeepOriginal),
        }
    }

    pub async fn normalize(&self, path: &Path) -> ImageRef {
        let image = ImageRef::new(path);
        if image.is_jpeg() {
            return image;
        }

        tracing::info!("Converting to JPG: {}", image.file_name());

        match self.converters.run(&image).await {
            Ok(resolved) if resolved.strategy == KeepOriginal::NAME => {
                tracing::warn!(
                    "Could not convert {} to JPG, using original format",
                    image.file_name()
                );
                image
            }
            Ok(resolved) => {
                let converted = ImageRef::new(resolved.value);
                tracing::info!(
                    converter = resolved.strategy,
                    "Converted to JPG: {}",
                    converted.file_name()
                );
                converted
            }
            Err(e) => {
                tracing::warn!("Could not convert {}: {}", image.file_name(), e);
                image
            }
        }
    }
}

/// Last link of every converter chain: hand the original file back.
struct KeepOriginal;

impl KeepOriginal {
    const NAME: &'static str = "keep-original";
}

#[async_trait]
impl FallibleStrategy<ImageRef, PathBuf> for KeepOriginal {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn attempt(&self, input: &ImageRef) -> Result<PathBuf, StrategyError> {
        Ok(input.path().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingConverter {
        hits: Arc<AtomicUsize>,
        succeed: bool,
    }

    #[async_trait]
    impl FallibleStrategy<ImageRef, PathBuf> for CountingConverter {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn attempt(&self, input: &ImageRef) -> Result<PathBuf, StrategyError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(input.jpeg_sibling())
            } else {
                Err(StrategyError::failed("unsupported format"))
            }
        }
    }

    fn normalizer(succeed: bool) -> (FormatNormalizer, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new().then(CountingConverter {
            hits: hits.clone(),
            succeed,
        });
        (FormatNormalizer::new(chain), hits)
    }

    #[tokio::test]
    async fn test_jpeg_path_is_returned_unchanged_without_conversion() {
        let (normalizer, hits) = normalizer(true);

        // The file does not exist: any I/O attempt would have to fail.
        let input = Path::new("/definitely/not/here/photo.JPG");
        let result = normalizer.normalize(input).await;

        assert_eq!(result.path(), input);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_jpeg_long_extension_is_also_untouched() {
        let (normalizer, hits) = normalizer(true);
        let result = normalizer.normalize(Path::new("drone/site.jpeg")).await;

        assert_eq!(result.path(), Path::new("drone/site.jpeg"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_formats_use_the_first_working_converter() {
        let (normalizer, hits) = normalizer(true);
        let result = normalizer.normalize(Path::new("drone/IMG_1.heic")).await;

        assert_eq!(result.path(), Path::new("drone/IMG_1.jpg"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_conversion_degrades_to_original_path() {
        let (normalizer, _) = normalizer(false);
        let result = normalizer.normalize(Path::new("drone/IMG_2.heic")).await;

        assert_eq!(result.path(), Path::new("drone/IMG_2.heic"));
        assert_eq!(result.extension(), "heic");
    }
}
