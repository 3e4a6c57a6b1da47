//! Image processing: transforms and size-targeted encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Resize** | `resize_exact`, configurable filter |
//! | **Rotate** | `rotate90` / `rotate180` / `rotate270` |
//! | **Square crop** | `crop_imm` on the centered region |
//! | **Encode** | `JpegEncoder` at a 0–1 quality, optionally bisected to a size budget |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and size math (unit testable)
//! - **Parameters**: Data structures describing requests, targets and search bounds
//! - **Backend**: [`Rasterizer`] + [`Encoder`] traits and [`RustBackend`]
//! - **Operations**: [`transform`] and the [`encode_to_target`] search

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Encoder, Rasterizer};
pub use operations::{OperationError, encode_fixed, encode_to_target, transform};
pub use params::{
    EncodeSettings, EncodeTarget, Quality, ResizeFilter, SearchParams, SizeUnit, TransformRequest,
    parse_dimension,
};
pub use rust_backend::RustBackend;
