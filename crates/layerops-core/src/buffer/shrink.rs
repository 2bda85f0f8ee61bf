//! Content bounds detection for crop-to-content.
//!
//! The background is taken from the four corners: if they do not agree the
//! buffer has no uniform border and cannot shrink. When the background is
//! transparent only alpha is compared, otherwise the full color is.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::{PixelBuffer, Rgba};

/// Outcome of scanning a buffer for its content rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentBounds {
    /// Content occupies a strict sub-rectangle of the buffer.
    Shrinkable {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// Every pixel matches the background.
    EmptyContent,
    /// Content already reaches all four edges.
    AlreadyMinimal,
}

/// Find the content rectangle of a layer buffer.
pub fn auto_shrink(buffer: &PixelBuffer) -> ContentBounds {
    if buffer.is_empty() {
        return ContentBounds::EmptyContent;
    }

    let (w, h) = (buffer.width, buffer.height);
    let corners = [
        buffer.pixel(0, 0),
        buffer.pixel(w - 1, 0),
        buffer.pixel(0, h - 1),
        buffer.pixel(w - 1, h - 1),
    ];
    let background = corners[0];
    if corners.iter().any(|&c| !same_background(c, background)) {
        return ContentBounds::AlreadyMinimal;
    }

    scan(w, h, |x, y| !same_background(buffer.pixel(x, y), background))
}

/// Find the content rectangle of a grayscale buffer (masks, channels).
pub fn auto_shrink_gray(buffer: &GrayImage) -> ContentBounds {
    let (w, h) = buffer.dimensions();
    if w == 0 || h == 0 {
        return ContentBounds::EmptyContent;
    }

    let value = |x: u32, y: u32| buffer.get_pixel(x, y).0[0];
    let background = value(0, 0);
    if value(w - 1, 0) != background || value(0, h - 1) != background || value(w - 1, h - 1) != background {
        return ContentBounds::AlreadyMinimal;
    }

    scan(w, h, |x, y| value(x, y) != background)
}

fn same_background(pixel: Rgba, background: Rgba) -> bool {
    if background[3] == 0 {
        pixel[3] == 0
    } else {
        pixel == background
    }
}

fn scan(width: u32, height: u32, is_content: impl Fn(u32, u32) -> bool) -> ContentBounds {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for y in 0..height {
        for x in 0..width {
            if is_content(x, y) {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if !found {
        return ContentBounds::EmptyContent;
    }

    let content_w = max_x - min_x + 1;
    let content_h = max_y - min_y + 1;
    if content_w == width && content_h == height {
        return ContentBounds::AlreadyMinimal;
    }

    ContentBounds::Shrinkable {
        x: min_x as i32,
        y: min_y as i32,
        width: content_w,
        height: content_h,
    }
}
