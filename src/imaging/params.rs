//! Parameter types for image operations.
//!
//! These describe *what* to do, not *how*. The
//! [`operations`](super::operations) module interprets them against a
//! [`Rasterizer`](super::backend::Rasterizer) and an
//! [`Encoder`](super::backend::Encoder), so a mock backend can stand in for
//! the real one without changing any operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality on a 0–1 scale. Clamped on construction.
//! - [`TransformRequest`]: resize, rotate, or square crop.
//! - [`EncodeTarget`] / [`SizeUnit`]: the requested output size.
//! - [`SearchParams`]: bounds and iteration count for the size search.
//! - [`EncodeSettings`]: default quality plus search bounds, as configured.
//! - [`ResizeFilter`]: resampling filter used when stretching to a new size.

use super::operations::OperationError;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy encoding, 0.0 (smallest) to 1.0 (best).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Map onto the 1–100 integer scale JPEG encoders take.
    pub fn to_jpeg(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }

    /// The quality the encoder actually applies, back on the 0–1 scale.
    pub fn encoded_value(self) -> f32 {
        f32::from(self.to_jpeg()) / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.9)
    }
}

/// Parse a user-entered dimension.
///
/// Must be an integer; positivity is checked when the request is applied, so
/// `"0"` parses here and fails there.
pub fn parse_dimension(label: &str, raw: &str) -> Result<u32, OperationError> {
    raw.trim().parse::<u32>().map_err(|_| {
        OperationError::InvalidInput(format!("{label} must be a positive integer, got {raw:?}"))
    })
}

/// One transform applied to the loaded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformRequest {
    /// Stretch the source to exactly `width × height`.
    Resize { width: u32, height: u32 },
    /// Advance the cumulative rotation by 90° clockwise.
    Rotate,
    /// Center-crop to a `min(w, h)` square.
    CropSquare,
}

impl TransformRequest {
    /// Short name used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resized",
            Self::Rotate => "rotated",
            Self::CropSquare => "cropped",
        }
    }
}

/// Unit of an [`EncodeTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[default]
    Kb,
    Mb,
}

/// Desired output size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeTarget {
    pub value: f64,
    pub unit: SizeUnit,
}

impl EncodeTarget {
    pub fn kb(value: f64) -> Self {
        Self {
            value,
            unit: SizeUnit::Kb,
        }
    }

    pub fn mb(value: f64) -> Self {
        Self {
            value,
            unit: SizeUnit::Mb,
        }
    }

    /// Budget in kilobytes (1 MB = 1024 KB).
    pub fn to_kb(self) -> f64 {
        match self.unit {
            SizeUnit::Kb => self.value,
            SizeUnit::Mb => self.value * 1024.0,
        }
    }
}

/// Bounds of the quality bisection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams {
    /// Lower bound, and the quality of the fallback encode when nothing fits.
    pub min_quality: f32,
    pub max_quality: f32,
    /// First quality tried.
    pub initial_quality: f32,
    pub iterations: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            min_quality: 0.05,
            max_quality: 1.0,
            initial_quality: 0.95,
            iterations: 10,
        }
    }
}

/// Everything the encode step needs besides the buffer and the target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncodeSettings {
    /// Quality used when there is no target to search for.
    pub default_quality: Quality,
    pub search: SearchParams,
}

/// Resampling filter for resizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for image::imageops::FilterType {
    fn from(filter: ResizeFilter) -> Self {
        use image::imageops::FilterType;
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_unit_range() {
        assert_eq!(Quality::new(-0.5).value(), 0.0);
        assert_eq!(Quality::new(0.42).value(), 0.42);
        assert_eq!(Quality::new(1.5).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN).value(), 0.0);
    }

    #[test]
    fn quality_default_is_0_9() {
        assert_eq!(Quality::default().value(), 0.9);
    }

    #[test]
    fn jpeg_mapping_never_leaves_1_to_100() {
        assert_eq!(Quality::new(0.0).to_jpeg(), 1);
        assert_eq!(Quality::new(0.05).to_jpeg(), 5);
        assert_eq!(Quality::new(0.9).to_jpeg(), 90);
        assert_eq!(Quality::new(1.0).to_jpeg(), 100);
    }

    #[test]
    fn encoded_value_is_the_rounded_jpeg_quality() {
        assert_eq!(Quality::new(0.4765625).encoded_value(), 0.48);
        assert_eq!(Quality::new(0.9).encoded_value(), 0.9);
        assert_eq!(Quality::new(0.0).encoded_value(), 0.01);
    }

    #[test]
    fn megabytes_normalise_to_kilobytes() {
        assert_eq!(EncodeTarget::mb(1.0).to_kb(), 1024.0);
        assert_eq!(EncodeTarget::kb(1024.0).to_kb(), 1024.0);
        assert_eq!(EncodeTarget::mb(0.5).to_kb(), 512.0);
    }

    #[test]
    fn dimension_accepts_integers_with_whitespace() {
        assert_eq!(parse_dimension("width", " 400").unwrap(), 400);
        assert_eq!(parse_dimension("height", "0").unwrap(), 0);
    }

    #[test]
    fn dimension_rejects_non_numeric() {
        assert!(matches!(
            parse_dimension("width", "abc"),
            Err(OperationError::InvalidInput(msg)) if msg.contains("width")
        ));
        assert!(parse_dimension("height", "").is_err());
        assert!(parse_dimension("width", "-5").is_err());
        assert!(parse_dimension("width", "12.5").is_err());
    }

    #[test]
    fn search_defaults() {
        let params = SearchParams::default();
        assert_eq!(params.min_quality, 0.05);
        assert_eq!(params.max_quality, 1.0);
        assert_eq!(params.initial_quality, 0.95);
        assert_eq!(params.iterations, 10);
    }

    #[test]
    fn filter_names_are_kebab_case() {
        let filter: ResizeFilter = toml::Value::String("catmull-rom".into())
            .try_into()
            .unwrap();
        assert_eq!(filter, ResizeFilter::CatmullRom);
    }
}
