//! Image selection and channels.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// How new selection content combines with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelOp {
    Add,
    Subtract,
    #[default]
    Replace,
    Intersect,
}

impl ChannelOp {
    pub const ALL: [ChannelOp; 4] = [
        ChannelOp::Add,
        ChannelOp::Subtract,
        ChannelOp::Replace,
        ChannelOp::Intersect,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// A named image-sized grayscale channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub buffer: GrayImage,
    pub visible: bool,
}

impl Channel {
    pub fn new(name: impl Into<String>, buffer: GrayImage) -> Self {
        Self {
            name: name.into(),
            buffer,
            visible: false,
        }
    }
}

/// The image selection: an image-sized grayscale coverage map.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    mask: GrayImage,
}

impl Selection {
    /// An empty selection.
    pub fn none(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    /// Everything selected.
    pub fn all(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::from_pixel(width, height, Luma([255])),
        }
    }

    /// A rectangle selection, clipped to the image.
    pub fn rect(width: u32, height: u32, x: i32, y: i32, rect_width: u32, rect_height: u32) -> Self {
        let mut selection = Self::none(width, height);
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + rect_width as i64).min(width as i64);
        let y1 = (y as i64 + rect_height as i64).min(height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                selection.mask.put_pixel(px as u32, py as u32, Luma([255]));
            }
        }
        selection
    }

    pub fn from_mask(mask: GrayImage) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.mask.get_pixel(x, y).0[0]
    }

    pub fn is_empty(&self) -> bool {
        self.mask.pixels().all(|p| p.0[0] == 0)
    }

    /// Bounding box `(x, y, width, height)` of the selected area, `None`
    /// when nothing is selected.
    pub fn bounds(&self) -> Option<(i32, i32, u32, u32)> {
        let (w, h) = self.mask.dimensions();
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut found = false;

        for (x, y, p) in self.mask.enumerate_pixels() {
            if p.0[0] != 0 {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        if !found || w == 0 || h == 0 {
            return None;
        }
        Some((
            min_x as i32,
            min_y as i32,
            max_x - min_x + 1,
            max_y - min_y + 1,
        ))
    }

    pub fn invert(&mut self) {
        for p in self.mask.pixels_mut() {
            p.0[0] = 255 - p.0[0];
        }
    }

    /// Combine a coverage map placed at `offset` (image coordinates) into
    /// the selection. Outside the map the coverage counts as zero.
    pub fn combine(&mut self, op: ChannelOp, coverage: &GrayImage, offset: (i32, i32)) {
        let (cw, ch) = coverage.dimensions();
        let (ox, oy) = offset;
        let sample = |x: u32, y: u32| -> u8 {
            let cx = x as i64 - ox as i64;
            let cy = y as i64 - oy as i64;
            if cx < 0 || cy < 0 || cx >= cw as i64 || cy >= ch as i64 {
                0
            } else {
                coverage.get_pixel(cx as u32, cy as u32).0[0]
            }
        };

        let (w, h) = self.mask.dimensions();
        for y in 0..h {
            for x in 0..w {
                let current = self.mask.get_pixel(x, y).0[0];
                let incoming = sample(x, y);
                let value = match op {
                    ChannelOp::Add => current.max(incoming),
                    ChannelOp::Subtract => current.saturating_sub(incoming),
                    ChannelOp::Replace => incoming,
                    ChannelOp::Intersect => current.min(incoming),
                };
                self.mask.put_pixel(x, y, Luma([value]));
            }
        }
    }
}
