// JPEG converters for the format normalizer.

pub mod external_tool;
pub mod image_crate_converter;

pub use external_tool::{HeifConverter, SipsConverter};
pub use image_crate_converter::ImageCrateConverter;

use crate::core::pipeline::{FallbackChain, ImageRef};
use std::path::PathBuf;
use std::time::Duration;

/// Converter order: native `sips`, then `heif-convert` for HEIC files the
/// `image` crate cannot decode, then the `image` crate itself.
pub fn default_converters(timeout: Duration) -> FallbackChain<ImageRef, PathBuf> {
    FallbackChain::new()
        .then(SipsConverter::new(timeout))
        .then(HeifConverter::new(timeout))
        .then(ImageCrateConverter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_order() {
        assert_eq!(
            default_converters(Duration::from_secs(30)).names(),
            vec!["sips", "heif-convert", "image-crate"]
        );
    }
}
