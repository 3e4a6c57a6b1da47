//! Input validation and loading.
//!
//! Everything a file has to pass before it becomes a
//! [`SourceImage`](crate::types::SourceImage):
//!
//! 1. It must exist and be no larger than `input.max_file_size_mb`. This is
//!    checked from metadata, before the file is read.
//! 2. Its content must sniff as one of the allowed formats. The extension is
//!    not trusted here; it is only used by `batch` to pick candidates.
//! 3. It must decode through the [`Rasterizer`].

use crate::config::InputConfig;
use crate::imaging::{BackendError, Rasterizer};
use crate::types::SourceImage;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {size} bytes; the limit is {limit} bytes")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("{path}: unsupported format ({found})")]
    UnsupportedFormat { path: PathBuf, found: String },
    #[error("{path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

/// Input formats the tool knows how to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl InputFormat {
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// File extensions conventionally used for this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Gif => &["gif"],
            Self::Webp => &["webp"],
        }
    }
}

/// Whether `path` has an extension belonging to one of `formats`.
pub fn has_allowed_extension(path: &Path, formats: &[InputFormat]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    formats
        .iter()
        .flat_map(|f| f.extensions())
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Read a file after checking its size and sniffed format against `config`.
pub fn read_validated(
    path: &Path,
    config: &InputConfig,
) -> Result<(InputFormat, Vec<u8>), LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    let limit = config.max_file_size_bytes();
    if size > limit {
        return Err(LoadError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }

    let bytes = std::fs::read(path).map_err(io_err)?;
    let detected = image::guess_format(&bytes).ok();
    let format = detected
        .and_then(InputFormat::from_image_format)
        .filter(|f| config.formats.contains(f))
        .ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            found: detected
                .map(|f| format!("{:?}", f).to_lowercase())
                .unwrap_or_else(|| "unrecognized".to_string()),
        })?;

    debug!(path = %path.display(), format = format.name(), size, "input accepted");
    Ok((format, bytes))
}

/// Validate and decode `path` into a source image.
pub fn load_source(
    rasterizer: &impl Rasterizer,
    path: &Path,
    config: &InputConfig,
) -> Result<SourceImage, LoadError> {
    let (_, bytes) = read_validated(path, config)?;
    rasterizer.decode(&bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Header-level facts about an input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub format: InputFormat,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

impl ImageInfo {
    pub fn aspect_ratio(&self) -> f64 {
        crate::imaging::calculations::aspect_ratio((self.width, self.height))
    }
}

/// Validate `path` and read its dimensions without a full decode.
pub fn inspect(path: &Path, config: &InputConfig) -> Result<ImageInfo, LoadError> {
    let (format, bytes) = read_validated(path, config)?;
    let decode_err = |e: image::ImageError| LoadError::Decode {
        path: path.to_path_buf(),
        source: BackendError::Decode(e.to_string()),
    };
    let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .into_dimensions()
        .map_err(decode_err)?;
    Ok(ImageInfo {
        format,
        width,
        height,
        file_size: bytes.len() as u64,
    })
}
