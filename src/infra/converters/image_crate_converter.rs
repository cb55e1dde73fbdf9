use crate::core::pipeline::{FallibleStrategy, ImageRef, StrategyError};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ImageReader;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const JPEG_QUALITY: u8 = 95;

/// Pure-Rust fallback: decode with the `image` crate and write an RGB JPEG.
///
/// Alpha and palette images are flattened to RGB first since JPEG carries
/// neither. HEIC is not among the decoders, so those files fail here.
pub struct ImageCrateConverter;

fn convert_blocking(input: &Path, output: &Path) -> image::ImageResult<()> {
    let decoded = ImageReader::open(input)?.with_guessed_format()?.decode()?;
    let rgb = decoded.to_rgb8();

    let writer = BufWriter::new(File::create(output)?);
    let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;
    Ok(())
}

#[async_trait]
impl FallibleStrategy<ImageRef, PathBuf> for ImageCrateConverter {
    fn name(&self) -> &'static str {
        "image-crate"
    }

    async fn attempt(&self, input: &ImageRef) -> Result<PathBuf, StrategyError> {
        let source = input.path().to_path_buf();
        let output = input.jpeg_sibling();
        let target = output.clone();

        tokio::task::spawn_blocking(move || convert_blocking(&source, &target))
            .await
            .map_err(StrategyError::failed)?
            .map_err(StrategyError::failed)?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[tokio::test]
    async fn test_png_with_alpha_becomes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("site.png");
        RgbaImage::from_pixel(8, 4, Rgba([200, 120, 40, 128]))
            .save(&png)
            .unwrap();

        let result = ImageCrateConverter
            .attempt(&ImageRef::new(&png))
            .await
            .unwrap();

        assert_eq!(result, dir.path().join("site.jpg"));
        let bytes = std::fs::read(&result).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let reopened = image::open(&result).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (8, 4));
    }

    #[tokio::test]
    async fn test_undecodable_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("broken.png");
        std::fs::write(&junk, b"not an image at all").unwrap();

        let result = ImageCrateConverter.attempt(&ImageRef::new(&junk)).await;

        assert!(matches!(result, Err(StrategyError::Failed(_))));
        assert!(!dir.path().join("broken.jpg").exists());
    }
}
