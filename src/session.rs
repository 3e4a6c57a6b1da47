//! Per-image editing state.
//!
//! A [`Session`] is a value: every operation takes `&self` and, on success,
//! returns the next session alongside its output. A failed operation returns
//! only an error, so the caller's session is untouched by construction.
//!
//! ## Rotation
//!
//! The cumulative angle lives here, not in any rendered buffer. Each rotate
//! advances it by 90° and re-renders the *original* source at the full
//! angle, so four rotates land back on the source exactly and repeated
//! rotation never compounds resampling loss. Loading a new image resets the
//! angle to 0.
//!
//! ## Aspect ratio
//!
//! The aspect ratio is only used to auto-fill one dimension from the other
//! ([`Session::linked_height`], [`Session::linked_width`]). Rotate and crop
//! move it to the new geometry; resize records the requested dimensions but
//! keeps the baseline, since the caller chose both values explicitly.

use std::sync::Arc;

use tracing::debug;

use crate::imaging::calculations::{self, aspect_ratio, next_rotation};
use crate::imaging::operations::{self, OperationError};
use crate::imaging::{EncodeSettings, EncodeTarget, Encoder, Rasterizer, TransformRequest};
use crate::types::{EncodeResult, RenderedBuffer, SourceImage};

/// Editing state for one loaded image (or none).
#[derive(Debug, Clone, Default)]
pub struct Session {
    source: Option<Arc<SourceImage>>,
    cumulative_rotation: u16,
    current_dimensions: Option<(u32, u32)>,
    aspect_ratio: Option<f64>,
}

/// What a full transform-then-encode pass produced.
#[derive(Debug, Clone)]
pub struct Output {
    pub width: u32,
    pub height: u32,
    pub encoded: EncodeResult,
}

impl Session {
    /// A session with nothing loaded. Every operation on it fails with
    /// [`OperationError::NoImageLoaded`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session on `source`, with rotation reset to 0.
    pub fn load(source: SourceImage) -> Self {
        let dims = source.dimensions();
        Self {
            source: Some(Arc::new(source)),
            cumulative_rotation: 0,
            current_dimensions: Some(dims),
            aspect_ratio: Some(aspect_ratio(dims)),
        }
    }

    /// Decode `bytes` and start a session on the result.
    pub fn open(rasterizer: &impl Rasterizer, bytes: &[u8]) -> Result<Self, OperationError> {
        let source = rasterizer.decode(bytes).map_err(OperationError::Rendering)?;
        Ok(Self::load(source))
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    pub fn cumulative_rotation(&self) -> u16 {
        self.cumulative_rotation
    }

    pub fn current_dimensions(&self) -> Option<(u32, u32)> {
        self.current_dimensions
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.aspect_ratio
    }

    /// Height matching `width` at the current aspect ratio.
    pub fn linked_height(&self, width: u32) -> Option<u32> {
        self.aspect_ratio
            .map(|aspect| calculations::linked_height(width, aspect))
    }

    /// Width matching `height` at the current aspect ratio.
    pub fn linked_width(&self, height: u32) -> Option<u32> {
        self.aspect_ratio
            .map(|aspect| calculations::linked_width(height, aspect))
    }

    /// Render `request` and return the next session with it.
    pub fn apply(
        &self,
        rasterizer: &impl Rasterizer,
        request: TransformRequest,
    ) -> Result<(Session, RenderedBuffer), OperationError> {
        let source = self.source.as_ref().ok_or(OperationError::NoImageLoaded)?;
        operations::validate_request(&request)?;

        let rotation = match request {
            TransformRequest::Rotate => next_rotation(self.cumulative_rotation),
            _ => self.cumulative_rotation,
        };
        let rendered = operations::transform(rasterizer, source, &request, rotation)?;
        let dims = rendered.dimensions();

        let next = Session {
            source: Some(Arc::clone(source)),
            cumulative_rotation: rotation,
            current_dimensions: Some(dims),
            aspect_ratio: match request {
                TransformRequest::Resize { .. } => self.aspect_ratio,
                _ => Some(aspect_ratio(dims)),
            },
        };
        debug!(
            op = request.label(),
            rotation = next.cumulative_rotation,
            width = dims.0,
            height = dims.1,
            "session updated"
        );
        Ok((next, rendered))
    }

    /// Render `request` and encode the result.
    ///
    /// Only a resize uses `target`; rotate and crop always encode once at the
    /// default quality.
    pub fn process<B: Rasterizer + Encoder>(
        &self,
        backend: &B,
        request: TransformRequest,
        target: Option<EncodeTarget>,
        settings: &EncodeSettings,
    ) -> Result<(Session, Output), OperationError> {
        let (next, rendered) = self.apply(backend, request)?;
        let target = match request {
            TransformRequest::Resize { .. } => target,
            _ => None,
        };
        let encoded = operations::encode_to_target(
            backend,
            &rendered,
            target,
            settings.default_quality,
            &settings.search,
        )?;
        let (width, height) = rendered.dimensions();
        Ok((
            next,
            Output {
                width,
                height,
                encoded,
            },
        ))
    }
}
