//! Tool configuration module.
//!
//! Handles loading, validating, and merging `imgfit.toml`. Stock defaults
//! are serialized to a TOML table first and the user file is merged on top
//! of it, so a config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! 1. The path given with `--config`, which must exist.
//! 2. Otherwise `imgfit.toml` in the working directory, if there is one.
//! 3. Otherwise the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [encoding]
//! default_quality = 0.9     # Quality when no target size is requested
//!
//! [search]
//! min_quality = 0.05        # Floor; also the fallback when nothing fits
//! max_quality = 1.0
//! initial_quality = 0.95    # First quality tried
//! iterations = 10           # Encodes per search
//!
//! [resize]
//! filter = "triangle"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//!
//! [input]
//! max_file_size_mb = 20
//! formats = ["jpeg", "png", "gif", "webp"]
//!
//! [processing]
//! max_processes = 4         # Batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{EncodeSettings, Quality, ResizeFilter, SearchParams};
use crate::source::InputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "imgfit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `imgfit.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Fixed-quality encoding settings.
    pub encoding: EncodingConfig,
    /// Bounds of the target-size quality search.
    pub search: SearchParams,
    /// Resampling settings.
    pub resize: ResizeConfig,
    /// Limits applied to input files before decoding.
    pub input: InputConfig,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = self.encoding.default_quality.value();
        if q <= 0.0 || q > 1.0 {
            return Err(ConfigError::Validation(
                "encoding.default_quality must be in (0, 1]".into(),
            ));
        }
        let s = &self.search;
        if !(0.0 < s.min_quality
            && s.min_quality <= s.initial_quality
            && s.initial_quality <= s.max_quality
            && s.max_quality <= 1.0)
        {
            return Err(ConfigError::Validation(
                "search qualities must satisfy 0 < min_quality <= initial_quality <= max_quality <= 1"
                    .into(),
            ));
        }
        if s.iterations == 0 {
            return Err(ConfigError::Validation(
                "search.iterations must be at least 1".into(),
            ));
        }
        if self.input.max_file_size_mb == 0 {
            return Err(ConfigError::Validation(
                "input.max_file_size_mb must be positive".into(),
            ));
        }
        if self.input.max_file_size_mb > InputConfig::MAX_FILE_SIZE_MB {
            return Err(ConfigError::Validation(format!(
                "input.max_file_size_mb must be at most {}",
                InputConfig::MAX_FILE_SIZE_MB
            )));
        }
        if self.input.formats.is_empty() {
            return Err(ConfigError::Validation(
                "input.formats must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Default quality and search bounds, as the encode step takes them.
    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            default_quality: self.encoding.default_quality,
            search: self.search,
        }
    }
}

/// Fixed-quality encoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// Quality (0–1) used for rotate, crop, and resizes without a target.
    pub default_quality: Quality,
}

/// Resampling settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
}

/// Limits applied before a file is decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Largest accepted input file, in megabytes.
    pub max_file_size_mb: u64,
    /// Accepted input formats, detected from content.
    pub formats: Vec<InputFormat>,
}

impl InputConfig {
    /// Largest limit whose byte count still fits in a `u64`.
    pub const MAX_FILE_SIZE_MB: u64 = u64::MAX / (1024 * 1024);

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 20,
            formats: vec![
                InputFormat::Jpeg,
                InputFormat::Png,
                InputFormat::Gif,
                InputFormat::Webp,
            ],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ToolConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, `imgfit.toml` in `dir` is used
/// when present and the stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ToolConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let implicit = dir.join(CONFIG_FILE_NAME);
            if implicit.exists() {
                Some(load_raw_config(&implicit)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `imgfit.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgfit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Fixed-quality encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality (0-1) for rotate, crop, and resizes without --target.
default_quality = 0.9

# ---------------------------------------------------------------------------
# Target-size search
# ---------------------------------------------------------------------------
[search]
# Lowest quality tried. If even this is over the target, it is used anyway
# and the achieved size is reported.
min_quality = 0.05
max_quality = 1.0
# First quality tried.
initial_quality = 0.95
# Number of encodes per search. Each halves the remaining quality range.
iterations = 10

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Resampling filter: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "triangle"

# ---------------------------------------------------------------------------
# Input validation
# ---------------------------------------------------------------------------
[input]
# Files larger than this are rejected before decoding.
max_file_size_mb = 20
# Accepted formats, detected from file content rather than extension.
formats = ["jpeg", "png", "gif", "webp"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `imgfit batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
