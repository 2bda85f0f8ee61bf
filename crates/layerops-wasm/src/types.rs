//! WASM-compatible wrapper types for layer pixels.
//!
//! This module provides JavaScript-friendly types that wrap the core layerops types,
//! handling the conversion between Rust and JavaScript data representations.

use layerops_core::buffer::{Interpolation, PixelBuffer};
use layerops_core::geometry::Unit;
use wasm_bindgen::prelude::*;

/// RGBA pixels of a layer or of the flattened image.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsLayerPixels {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsLayerPixels {
    /// Create pixels from dimensions and RGBA data (4 bytes per pixel, row-major order).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsLayerPixels {
        JsLayerPixels {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array. This copies the data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsLayerPixels {
    pub(crate) fn from_buffer(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            pixels: buffer.pixels.clone(),
        }
    }
}

/// Convert a u8 interpolation value to the core Interpolation enum.
///
/// Values follow menu order: 0 = None, 1 = Linear, 2 = Cubic, 3 = NoHalo,
/// 4 = LoHalo. Any other value defaults to Cubic.
pub(crate) fn interpolation_from_u8(value: u8) -> Interpolation {
    Interpolation::ALL
        .get(value as usize)
        .copied()
        .unwrap_or_default()
}

/// Convert a u8 unit value to the core Unit enum.
///
/// Values: 0 = px, 1 = %, 2 = in, 3 = mm, 4 = pt, 5 = pc. Any other value
/// defaults to pixels.
pub(crate) fn unit_from_u8(value: u8) -> Unit {
    Unit::from_index(value as usize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_from_buffer() {
        let buffer = PixelBuffer::filled(3, 2, [1, 2, 3, 4]);
        let js = JsLayerPixels::from_buffer(&buffer);
        assert_eq!(js.width(), 3);
        assert_eq!(js.height(), 2);
        assert_eq!(js.byte_length(), 24);
        assert_eq!(&js.pixels()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_interpolation_from_u8() {
        assert_eq!(interpolation_from_u8(0), Interpolation::None);
        assert_eq!(interpolation_from_u8(1), Interpolation::Linear);
        assert_eq!(interpolation_from_u8(4), Interpolation::LoHalo);
        // Unknown values default to Cubic
        assert_eq!(interpolation_from_u8(5), Interpolation::Cubic);
        assert_eq!(interpolation_from_u8(255), Interpolation::Cubic);
    }

    #[test]
    fn test_unit_from_u8() {
        assert_eq!(unit_from_u8(0), Unit::Pixel);
        assert_eq!(unit_from_u8(1), Unit::Percent);
        assert_eq!(unit_from_u8(9), Unit::Pixel);
    }
}
