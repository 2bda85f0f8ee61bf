//! Content resampling for layer scaling.
//!
//! Uses the `image` crate's resize algorithms. All functions return new
//! buffers without modifying the input.

use image::GrayImage;

use super::{BufferError, Interpolation, PixelBuffer};

/// Scale a layer buffer to exact dimensions.
///
/// # Errors
///
/// Returns `BufferError::InvalidDimensions` for a zero target size and
/// `BufferError::SizeMismatch` if the source data is inconsistent.
pub fn scale(
    buffer: &PixelBuffer,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<PixelBuffer, BufferError> {
    if width == 0 || height == 0 {
        return Err(BufferError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if buffer.width == width && buffer.height == height {
        return Ok(buffer.clone());
    }

    let rgba = buffer.to_rgba_image().ok_or(BufferError::SizeMismatch {
        expected: buffer.width as usize * buffer.height as usize * PixelBuffer::CHANNELS,
        actual: buffer.pixels.len(),
    })?;

    let resized = image::imageops::resize(&rgba, width, height, interpolation.to_image_filter());

    Ok(PixelBuffer::from_rgba_image(resized))
}

/// Scale a grayscale mask or channel buffer.
pub fn scale_gray(
    buffer: &GrayImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<GrayImage, BufferError> {
    if width == 0 || height == 0 {
        return Err(BufferError::InvalidDimensions { width, height });
    }
    if buffer.dimensions() == (width, height) {
        return Ok(buffer.clone());
    }
    Ok(image::imageops::resize(
        buffer,
        width,
        height,
        interpolation.to_image_filter(),
    ))
}

/// Scale `length` by `factor`, never going below one pixel.
pub(crate) fn scaled_length(length: u32, factor: f64) -> u32 {
    ((length as f64 * factor).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_buffer(width: u32, height: u32) -> PixelBuffer {
        // Simple gradient with varying alpha
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
                pixels.push(128);
                pixels.push(255);
            }
        }
        PixelBuffer::new(width, height, pixels)
    }

    #[test]
    fn test_scale_basic() {
        let buf = create_test_buffer(100, 50);
        let scaled = scale(&buf, 50, 25, Interpolation::Linear).unwrap();

        assert_eq!(scaled.width, 50);
        assert_eq!(scaled.height, 25);
        assert_eq!(scaled.pixels.len(), 50 * 25 * 4);
    }

    #[test]
    fn test_scale_same_dimensions() {
        let buf = create_test_buffer(100, 50);
        let scaled = scale(&buf, 100, 50, Interpolation::Cubic).unwrap();

        assert_eq!(scaled, buf);
    }

    #[test]
    fn test_scale_upscale() {
        let buf = create_test_buffer(50, 25);
        let scaled = scale(&buf, 100, 50, Interpolation::NoHalo).unwrap();

        assert_eq!(scaled.width, 100);
        assert_eq!(scaled.height, 50);
    }

    #[test]
    fn test_scale_zero_dimensions_error() {
        let buf = create_test_buffer(100, 50);

        assert!(scale(&buf, 0, 50, Interpolation::Linear).is_err());
        assert!(scale(&buf, 50, 0, Interpolation::Linear).is_err());
    }

    #[test]
    fn test_nearest_keeps_exact_values() {
        let buf = PixelBuffer::filled(4, 4, [12, 34, 56, 255]);
        let scaled = scale(&buf, 8, 8, Interpolation::None).unwrap();
        assert!(scaled
            .pixels
            .chunks_exact(4)
            .all(|px| px == [12, 34, 56, 255]));
    }

    #[test]
    fn test_all_interpolations() {
        let buf = create_test_buffer(40, 20);

        for interpolation in Interpolation::ALL {
            let scaled = scale(&buf, 20, 10, interpolation).unwrap();
            assert_eq!(scaled.width, 20);
            assert_eq!(scaled.height, 10);
        }
    }

    #[test]
    fn test_scale_gray() {
        let mask = GrayImage::from_pixel(10, 10, image::Luma([255]));
        let scaled = scale_gray(&mask, 5, 20, Interpolation::Linear).unwrap();
        assert_eq!(scaled.dimensions(), (5, 20));
        assert!(scale_gray(&mask, 0, 1, Interpolation::Linear).is_err());
    }

    #[test]
    fn test_scaled_length_minimum() {
        assert_eq!(scaled_length(100, 0.5), 50);
        assert_eq!(scaled_length(3, 0.01), 1);
        assert_eq!(scaled_length(10, 1.25), 13);
    }
}
