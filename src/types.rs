//! Raster and result types shared by the session, the imaging operations,
//! and the command-line front end.
//!
//! Pixel storage is an [`image::DynamicImage`] in both raster types. The
//! wrappers exist to make the lifecycle explicit: a [`SourceImage`] is what a
//! session owns, a [`RenderedBuffer`] is what a transform hands to the
//! encoder, and an [`EncodeResult`] is what goes back to the caller.

use image::DynamicImage;
use serde::Serialize;

use crate::imaging::calculations::size_kb;

/// A decoded image with non-zero dimensions.
///
/// Immutable once constructed. A session replaces it wholesale on the next
/// load instead of mutating pixels in place.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
}

impl SourceImage {
    /// Wrap a decoded image. Returns `None` for a zero-width or zero-height raster.
    pub fn new(image: DynamicImage) -> Option<Self> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        Some(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.image
    }
}

/// The raster produced by applying a transform to a [`SourceImage`].
///
/// Unlike [`SourceImage`] this may be zero-area: backends are free to hand
/// one back, and the encoder is where that gets rejected.
#[derive(Debug, Clone)]
pub struct RenderedBuffer {
    image: DynamicImage,
}

impl RenderedBuffer {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Read back the rendered pixels.
    pub fn pixels(&self) -> &DynamicImage {
        &self.image
    }
}

/// Encoded output plus the metadata a caller needs for status text.
///
/// `size_kb` is always `ceil(bytes.len() / 1024)`; construct through
/// [`EncodeResult::new`] to keep that true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size_kb: u64,
    /// Quality on the 0–1 scale the bytes were encoded at.
    pub quality: f32,
    /// Number of encodes performed to produce this result.
    pub attempts: u32,
}

impl EncodeResult {
    pub fn new(bytes: Vec<u8>, quality: f32, attempts: u32) -> Self {
        let size_kb = size_kb(bytes.len());
        Self {
            bytes,
            size_kb,
            quality,
            attempts,
        }
    }

    /// Whether this result is over the given budget.
    ///
    /// Not an error: callers report the achieved size instead of rejecting it.
    pub fn exceeds(&self, target_kb: f64) -> bool {
        self.size_kb as f64 > target_kb
    }
}
