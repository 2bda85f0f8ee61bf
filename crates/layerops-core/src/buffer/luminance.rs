//! Grayscale conversion using ITU-R BT.709 coefficients.
//!
//! Used when layer content is turned into a mask or a selection.

use image::{GrayImage, Luma};

use super::{PixelBuffer, Rgba};

/// ITU-R BT.709 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.2126;

/// ITU-R BT.709 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.7152;

/// ITU-R BT.709 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.0722;

/// Luminance of normalized RGB values (0.0 to 1.0).
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}

/// Luminance of an 8-bit pixel, ignoring alpha.
#[inline]
pub fn luminance_u8(pixel: Rgba) -> u8 {
    let lum = LUMINANCE_R * pixel[0] as f32
        + LUMINANCE_G * pixel[1] as f32
        + LUMINANCE_B * pixel[2] as f32;
    lum.clamp(0.0, 255.0).round() as u8
}

/// Grayscale copy of a buffer, with alpha folded in as coverage.
pub fn to_gray(buffer: &PixelBuffer) -> GrayImage {
    GrayImage::from_fn(buffer.width, buffer.height, |x, y| {
        let px = buffer.pixel(x, y);
        let value = luminance_u8(px) as u32 * px[3] as u32 / 255;
        Luma([value as u8])
    })
}

/// The alpha channel of a buffer as a grayscale image.
pub fn alpha_to_gray(buffer: &PixelBuffer) -> GrayImage {
    GrayImage::from_fn(buffer.width, buffer.height, |x, y| Luma([buffer.pixel(x, y)[3]]))
}
