//! Canvas boundary changes.
//!
//! Resizing a canvas reinterprets the buffer bounds without resampling: a new
//! buffer of the target size is allocated and the old content is copied in at
//! an offset. Content falling outside the new bounds is clipped, newly exposed
//! area gets the fill value.
//!
//! # Coordinate System
//!
//! - `(offset_x, offset_y)` is where the old (0, 0) lands in the new buffer
//! - Negative offsets crop from the top-left
//! - Origin is top-left corner

use image::{GrayImage, Luma};

use super::{BufferError, PixelBuffer, Rgba};

/// Resize the canvas of a layer buffer.
///
/// # Arguments
///
/// * `buffer` - Source buffer
/// * `width` - New width in pixels
/// * `height` - New height in pixels
/// * `offset_x` - Horizontal position of the old content in the new buffer
/// * `offset_y` - Vertical position of the old content in the new buffer
/// * `fill` - Color for the newly exposed area
///
/// # Example
///
/// ```
/// use layerops_core::buffer::{resize_canvas, PixelBuffer, TRANSPARENT};
///
/// let buf = PixelBuffer::filled(100, 100, [255, 0, 0, 255]);
///
/// // Keep the center 50x50 region
/// let cropped = resize_canvas(&buf, 50, 50, -25, -25, TRANSPARENT).unwrap();
/// assert_eq!(cropped.width, 50);
/// ```
pub fn resize_canvas(
    buffer: &PixelBuffer,
    width: u32,
    height: u32,
    offset_x: i32,
    offset_y: i32,
    fill: Rgba,
) -> Result<PixelBuffer, BufferError> {
    if width == 0 || height == 0 {
        return Err(BufferError::InvalidDimensions { width, height });
    }

    // Fast path: same bounds, nothing moves
    if width == buffer.width && height == buffer.height && offset_x == 0 && offset_y == 0 {
        return Ok(buffer.clone());
    }

    let mut output = PixelBuffer::filled(width, height, fill);

    let Some(span) = overlap(buffer.width, buffer.height, width, height, offset_x, offset_y) else {
        return Ok(output);
    };

    // Copy pixel data row by row for efficiency
    let row_bytes = span.width as usize * PixelBuffer::CHANNELS;
    for row in 0..span.height {
        let src_start = ((span.src_y + row) as usize * buffer.width as usize + span.src_x as usize)
            * PixelBuffer::CHANNELS;
        let dst_start = ((span.dst_y + row) as usize * width as usize + span.dst_x as usize)
            * PixelBuffer::CHANNELS;
        output.pixels[dst_start..dst_start + row_bytes]
            .copy_from_slice(&buffer.pixels[src_start..src_start + row_bytes]);
    }

    Ok(output)
}

/// Resize the canvas of a grayscale mask or channel.
pub fn resize_gray(
    buffer: &GrayImage,
    width: u32,
    height: u32,
    offset_x: i32,
    offset_y: i32,
    fill: u8,
) -> Result<GrayImage, BufferError> {
    if width == 0 || height == 0 {
        return Err(BufferError::InvalidDimensions { width, height });
    }

    let mut output = GrayImage::from_pixel(width, height, Luma([fill]));
    let (src_w, src_h) = buffer.dimensions();

    if let Some(span) = overlap(src_w, src_h, width, height, offset_x, offset_y) {
        for row in 0..span.height {
            for col in 0..span.width {
                let value = buffer.get_pixel(span.src_x + col, span.src_y + row);
                output.put_pixel(span.dst_x + col, span.dst_y + row, *value);
            }
        }
    }

    Ok(output)
}

/// Crop a buffer to a rectangle given in buffer coordinates.
///
/// The rectangle is clipped to the buffer; a rectangle entirely outside
/// produces a transparent buffer of the requested size.
pub fn crop(
    buffer: &PixelBuffer,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> Result<PixelBuffer, BufferError> {
    resize_canvas(buffer, width, height, -x, -y, super::TRANSPARENT)
}

/// The region shared by a source buffer and a destination placed at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    src_x: u32,
    src_y: u32,
    dst_x: u32,
    dst_y: u32,
    width: u32,
    height: u32,
}

fn overlap(
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    offset_x: i32,
    offset_y: i32,
) -> Option<Span> {
    let left = (offset_x as i64).max(0);
    let top = (offset_y as i64).max(0);
    let right = (offset_x as i64 + src_w as i64).min(dst_w as i64);
    let bottom = (offset_y as i64 + src_h as i64).min(dst_h as i64);

    if right <= left || bottom <= top {
        return None;
    }

    Some(Span {
        src_x: (left - offset_x as i64) as u32,
        src_y: (top - offset_y as i64) as u32,
        dst_x: left as u32,
        dst_y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
