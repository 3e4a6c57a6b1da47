//! # imgfit
//!
//! Resize, rotate and square-crop images, and encode the result as a JPEG
//! that fits a file-size budget.
//!
//! # Architecture: Session, Transform, Encode
//!
//! ```text
//! file ──source──▶ SourceImage ──Session::apply──▶ RenderedBuffer ──encode──▶ JPEG bytes
//!                      ▲                │
//!                      └── retained ────┘  (rotation always re-renders from here)
//! ```
//!
//! - A [`session::Session`] holds the decoded original plus the state an
//!   edit needs: cumulative rotation, current dimensions, and the aspect
//!   baseline used to link width and height.
//! - Sessions are values. `apply` returns the next session alongside the
//!   rendered pixels, so a failed edit leaves the caller's session untouched.
//! - Encoding is separate from transforming. A plain edit encodes once; a
//!   resize with a target runs the quality bisection in
//!   [`imaging::encode_to_target`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Backend traits, geometry math, transforms and the size-targeted encoder |
//! | [`session`] | Per-image editing state and the `apply` / `process` entry points |
//! | [`source`] | Input validation (size limit, sniffed format) and loading |
//! | [`pipeline`] | One file end to end: load, edit, encode, write, report |
//! | [`batch`] | Directory walk plus parallel [`pipeline`] runs |
//! | [`config`] | `imgfit.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI text formatting |
//! | [`types`] | Image and encode-result types shared across modules |
//!
//! # Design Decisions
//!
//! ## Rotation Re-renders From the Original
//!
//! Rotating an already-rotated buffer compounds resampling error and, for a
//! rotate after a resize, silently throws away resolution. The session keeps
//! the original and a cumulative angle instead, and every rotation renders
//! the original at that angle.
//!
//! ## JPEG Only
//!
//! Output is always JPEG, whatever the input. JPEG quality is a single
//! monotone knob, which is what makes bisecting toward a byte budget work.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding all go through the `image` crate. There
//! are no system libraries to install and the binary is self-contained.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
