//! Pure Rust backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with the configured [`ResizeFilter`] |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! JPEG has no alpha channel, so buffers are flattened to RGB8 before encoding.

use super::backend::{BackendError, Encoder, Rasterizer};
use super::calculations::CropRegion;
use super::params::{Quality, ResizeFilter};
use crate::types::{RenderedBuffer, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Backend using the `image` crate for both rasterizing and encoding.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    filter: ResizeFilter,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: ResizeFilter) -> Self {
        Self { filter }
    }
}

impl Rasterizer for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(format!("Failed to decode image: {}", e)))?;
        SourceImage::new(image)
            .ok_or_else(|| BackendError::Decode("Image has zero width or height".into()))
    }

    fn resize(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RenderedBuffer, BackendError> {
        let resized = source
            .pixels()
            .resize_exact(width, height, self.filter.into());
        Ok(RenderedBuffer::new(resized))
    }

    fn rotate(&self, source: &SourceImage, degrees: u16) -> Result<RenderedBuffer, BackendError> {
        let img = source.pixels();
        let rotated = match degrees {
            0 => img.clone(),
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            other => {
                return Err(BackendError::ProcessingFailed(format!(
                    "Rotation must be a multiple of 90 below 360, got {}",
                    other
                )));
            }
        };
        Ok(RenderedBuffer::new(rotated))
    }

    fn crop(
        &self,
        source: &SourceImage,
        region: CropRegion,
    ) -> Result<RenderedBuffer, BackendError> {
        let (w, h) = source.dimensions();
        if region.x.saturating_add(region.width) > w || region.y.saturating_add(region.height) > h
        {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop region {}x{}+{}+{} is outside the {}x{} source",
                region.width, region.height, region.x, region.y, w, h
            )));
        }
        let cropped = source
            .pixels()
            .crop_imm(region.x, region.y, region.width, region.height);
        Ok(RenderedBuffer::new(cropped))
    }
}

impl Encoder for RustBackend {
    fn encode(&self, buffer: &RenderedBuffer, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let (width, height) = buffer.dimensions();
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot encode a {}x{} buffer",
                width, height
            )));
        }
        let rgb = buffer.pixels().to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.to_jpeg())
            .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encode_png, gradient_image, noisy_image};
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    #[test]
    fn decode_png_from_memory() {
        let bytes = encode_png(&gradient_image(120, 80));
        let source = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!(source.dimensions(), (120, 80));
    }

    #[test]
    fn decode_garbage_errors() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn resize_stretches_to_exact_box() {
        let source = SourceImage::new(gradient_image(200, 100)).unwrap();
        let backend = RustBackend::new();

        // Aspect deliberately changed: 2:1 → 1:3
        let out = backend.resize(&source, 50, 150).unwrap();
        assert_eq!(out.dimensions(), (50, 150));
    }

    #[test]
    fn rotate_quarter_turn_moves_top_left_to_top_right() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let source = SourceImage::new(DynamicImage::ImageRgb8(img)).unwrap();

        let out = RustBackend::new().rotate(&source, 90).unwrap();
        assert_eq!(out.dimensions(), (2, 4));
        // Clockwise: the old top-left corner ends up top-right
        assert_eq!(out.pixels().get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn rotate_full_turn_is_identity_geometry() {
        let source = SourceImage::new(gradient_image(30, 20)).unwrap();
        let backend = RustBackend::new();
        assert_eq!(backend.rotate(&source, 0).unwrap().dimensions(), (30, 20));
        assert_eq!(backend.rotate(&source, 180).unwrap().dimensions(), (30, 20));
        assert_eq!(backend.rotate(&source, 270).unwrap().dimensions(), (20, 30));
    }

    #[test]
    fn rotate_rejects_non_quarter_angles() {
        let source = SourceImage::new(gradient_image(10, 10)).unwrap();
        assert!(matches!(
            RustBackend::new().rotate(&source, 45),
            Err(BackendError::ProcessingFailed(_))
        ));
    }

    #[test]
    fn crop_copies_region() {
        let source = SourceImage::new(gradient_image(80, 60)).unwrap();
        let region = CropRegion {
            x: 10,
            y: 0,
            width: 60,
            height: 60,
        };
        let out = RustBackend::new().crop(&source, region).unwrap();
        assert_eq!(out.dimensions(), (60, 60));
        assert_eq!(
            out.pixels().get_pixel(0, 0),
            source.pixels().get_pixel(10, 0)
        );
    }

    #[test]
    fn crop_outside_source_errors() {
        let source = SourceImage::new(gradient_image(20, 20)).unwrap();
        let region = CropRegion {
            x: 10,
            y: 0,
            width: 20,
            height: 20,
        };
        assert!(matches!(
            RustBackend::new().crop(&source, region),
            Err(BackendError::ProcessingFailed(_))
        ));
    }

    #[test]
    fn encode_produces_jpeg() {
        let buffer = RenderedBuffer::new(gradient_image(64, 48));
        let bytes = RustBackend::new()
            .encode(&buffer, Quality::default())
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn encode_flattens_alpha() {
        let buffer = RenderedBuffer::new(DynamicImage::new_rgba8(16, 16));
        assert!(RustBackend::new().encode(&buffer, Quality::new(0.5)).is_ok());
    }

    #[test]
    fn encode_size_grows_with_quality() {
        let buffer = RenderedBuffer::new(noisy_image(128, 128));
        let backend = RustBackend::new();
        let low = backend.encode(&buffer, Quality::new(0.1)).unwrap().len();
        let high = backend.encode(&buffer, Quality::new(0.95)).unwrap().len();
        assert!(high > low, "expected {high} > {low}");
    }

    #[test]
    fn encode_zero_area_errors() {
        let buffer = RenderedBuffer::new(DynamicImage::new_rgb8(0, 0));
        assert!(RustBackend::new().encode(&buffer, Quality::default()).is_err());
    }
}
