//! Capability traits for the pixel work, and shared error type.
//!
//! The operations layer never touches a codec or a resampler directly. It
//! talks to two traits:
//!
//! - [`Rasterizer`]: decode bytes into a [`SourceImage`] and render the three
//!   transforms (resize, rotate, crop) into a [`RenderedBuffer`].
//! - [`Encoder`]: turn a [`RenderedBuffer`] plus a [`Quality`] into bytes.
//!
//! The size search only ever sees the encoder as a black box that maps
//! quality to a byte count, which is what makes it testable with the
//! [`MockBackend`](tests::MockBackend) below.
//!
//! The production implementation of both traits is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::calculations::CropRegion;
use super::params::Quality;
use crate::types::{RenderedBuffer, SourceImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Decodes images and renders transforms.
pub trait Rasterizer: Sync {
    /// Decode an encoded image held in memory.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, BackendError>;

    /// Stretch the whole source into exactly `width × height`.
    fn resize(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
    ) -> Result<RenderedBuffer, BackendError>;

    /// Rotate clockwise by `degrees`, one of 0, 90, 180, 270.
    fn rotate(&self, source: &SourceImage, degrees: u16) -> Result<RenderedBuffer, BackendError>;

    /// Copy out `region`, which must lie inside the source.
    fn crop(&self, source: &SourceImage, region: CropRegion)
    -> Result<RenderedBuffer, BackendError>;
}

/// Lossy encoder driven by a single quality knob.
pub trait Encoder: Sync {
    fn encode(&self, buffer: &RenderedBuffer, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
