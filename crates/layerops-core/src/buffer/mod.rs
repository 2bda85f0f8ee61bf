//! Pixel storage and the geometry primitives layers are built from.
//!
//! This module provides:
//! - RGBA layer buffers ([`PixelBuffer`])
//! - Canvas boundary changes without resampling ([`resize_canvas`])
//! - Content resampling for scaling ([`scale`])
//! - Content bounds detection for crop-to-content ([`auto_shrink`])
//!
//! Masks, channels and the selection are plain `image::GrayImage` buffers.

mod canvas;
pub mod luminance;
mod resample;
mod shrink;
mod types;

pub use canvas::{crop, resize_canvas, resize_gray};
pub(crate) use resample::scaled_length;
pub use resample::{scale, scale_gray};
pub use shrink::{auto_shrink, auto_shrink_gray, ContentBounds};
pub use types::{BufferError, Interpolation, PixelBuffer, Rgba, TRANSPARENT};
