//! Pure calculation functions for geometry and sizes.
//!
//! All functions here are pure and testable without any I/O or images.

/// Kilobytes occupied by `len` bytes, rounded up.
pub fn size_kb(len: usize) -> u64 {
    (len as u64).div_ceil(1024)
}

/// Advance a cumulative rotation by a quarter turn, wrapping at 360.
pub fn next_rotation(degrees: u16) -> u16 {
    (degrees + 90) % 360
}

/// Output dimensions of a `(width, height)` raster rotated by `degrees`.
///
/// Quarter and three-quarter turns swap the axes; half and full turns don't.
///
/// ```
/// # use imgfit::imaging::calculations::rotated_dimensions;
/// assert_eq!(rotated_dimensions((800, 600), 90), (600, 800));
/// assert_eq!(rotated_dimensions((800, 600), 180), (800, 600));
/// ```
pub fn rotated_dimensions(dims: (u32, u32), degrees: u16) -> (u32, u32) {
    let (w, h) = dims;
    if degrees % 180 == 90 { (h, w) } else { (w, h) }
}

/// A crop rectangle within a source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest square centered in a `(width, height)` raster.
///
/// Offsets use integer division, so an odd leftover pixel lands on the
/// right or bottom edge.
pub fn center_square(dims: (u32, u32)) -> CropRegion {
    let (w, h) = dims;
    let size = w.min(h);
    CropRegion {
        x: (w - size) / 2,
        y: (h - size) / 2,
        width: size,
        height: size,
    }
}

/// Aspect ratio as `width / height`.
pub fn aspect_ratio(dims: (u32, u32)) -> f64 {
    dims.0 as f64 / dims.1 as f64
}

/// Height that keeps `aspect` for the given width. Never below 1.
pub fn linked_height(width: u32, aspect: f64) -> u32 {
    ((width as f64 / aspect).round() as u32).max(1)
}

/// Width that keeps `aspect` for the given height. Never below 1.
pub fn linked_width(height: u32, aspect: f64) -> u32 {
    ((height as f64 * aspect).round() as u32).max(1)
}
