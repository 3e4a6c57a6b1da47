//! High-level image operations.
//!
//! [`transform`] renders one [`TransformRequest`] against a source image, and
//! [`encode_to_target`] searches for the encoding quality that fits a byte
//! budget. Both take their backend by trait, so the logic here is exercised
//! in tests with a mock whose quality → size curve is known exactly.

use super::backend::{BackendError, Encoder, Rasterizer};
use super::calculations::{center_square, size_kb};
use super::params::{EncodeTarget, Quality, SearchParams, TransformRequest};
use crate::types::{EncodeResult, RenderedBuffer, SourceImage};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum OperationError {
    #[error("No image loaded")]
    NoImageLoaded,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Encoding unavailable: {0}")]
    EncodingUnavailable(#[source] BackendError),
    #[error("Rendering failed: {0}")]
    Rendering(#[source] BackendError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Reject requests that can never render, before anything is touched.
pub fn validate_request(request: &TransformRequest) -> Result<()> {
    match *request {
        TransformRequest::Resize { width, height } if width == 0 || height == 0 => {
            Err(OperationError::InvalidInput(format!(
                "width and height must be positive, got {}x{}",
                width, height
            )))
        }
        _ => Ok(()),
    }
}

/// Render `request` from the original `source`.
///
/// `rotation` is the cumulative angle *after* this request has been
/// accounted for; a rotate always renders the source at the full angle
/// rather than turning a previous output again.
pub fn transform(
    rasterizer: &impl Rasterizer,
    source: &SourceImage,
    request: &TransformRequest,
    rotation: u16,
) -> Result<RenderedBuffer> {
    validate_request(request)?;

    let rendered = match *request {
        TransformRequest::Resize { width, height } => rasterizer.resize(source, width, height),
        TransformRequest::Rotate => rasterizer.rotate(source, rotation),
        TransformRequest::CropSquare => rasterizer.crop(source, center_square(source.dimensions())),
    }
    .map_err(OperationError::Rendering)?;

    debug!(
        op = request.label(),
        from_w = source.width(),
        from_h = source.height(),
        to_w = rendered.width(),
        to_h = rendered.height(),
        "rendered transform"
    );
    Ok(rendered)
}

fn encode_once(encoder: &impl Encoder, buffer: &RenderedBuffer, quality: Quality) -> Result<Vec<u8>> {
    encoder
        .encode(buffer, quality)
        .map_err(OperationError::EncodingUnavailable)
}

/// Single encode at a fixed quality.
pub fn encode_fixed(
    encoder: &impl Encoder,
    buffer: &RenderedBuffer,
    quality: Quality,
) -> Result<EncodeResult> {
    let bytes = encode_once(encoder, buffer, quality)?;
    Ok(EncodeResult::new(bytes, quality.encoded_value(), 1))
}

/// Encode `buffer` as close to `target` as possible without going over.
///
/// Without a usable target (absent, zero, or negative) this is a single
/// encode at `default_quality`. Otherwise it bisects the quality range for
/// exactly `params.iterations` encodes, keeping the last candidate that fit.
/// If none fit, one more encode at `params.min_quality` is returned even
/// though it is over budget; check [`EncodeResult::exceeds`].
pub fn encode_to_target(
    encoder: &impl Encoder,
    buffer: &RenderedBuffer,
    target: Option<EncodeTarget>,
    default_quality: Quality,
    params: &SearchParams,
) -> Result<EncodeResult> {
    let target_kb = match target.map(EncodeTarget::to_kb) {
        Some(kb) if kb > 0.0 => kb,
        _ => return encode_fixed(encoder, buffer, default_quality),
    };

    let mut min_quality = params.min_quality;
    let mut max_quality = params.max_quality;
    let mut quality = params.initial_quality;
    let mut best: Option<(Vec<u8>, Quality)> = None;
    let mut attempts = 0;

    for iteration in 0..params.iterations {
        let candidate = Quality::new(quality);
        let bytes = encode_once(encoder, buffer, candidate)?;
        attempts += 1;
        let candidate_kb = size_kb(bytes.len());
        let fits = candidate_kb as f64 <= target_kb;
        debug!(iteration, quality, candidate_kb, target_kb, fits, "size search step");

        if fits {
            best = Some((bytes, candidate));
            min_quality = quality;
            quality = (quality + max_quality) / 2.0;
        } else {
            max_quality = quality;
            quality = (quality + min_quality) / 2.0;
        }
    }

    let result = match best {
        Some((bytes, quality)) => EncodeResult::new(bytes, quality.encoded_value(), attempts),
        None => {
            let floor = Quality::new(params.min_quality);
            let bytes = encode_once(encoder, buffer, floor)?;
            let result = EncodeResult::new(bytes, floor.encoded_value(), attempts + 1);
            warn!(
                target_kb,
                achieved_kb = result.size_kb,
                "target size unreachable, using minimum quality"
            );
            return Ok(result);
        }
    };

    info!(
        target_kb,
        achieved_kb = result.size_kb,
        quality = result.quality,
        "size search finished"
    );
    Ok(result)
}
