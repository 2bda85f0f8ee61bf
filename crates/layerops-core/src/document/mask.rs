//! Layer masks.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// A grayscale mask attached to a layer, the same size as the layer.
///
/// White keeps the layer, black hides it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerMask {
    pub buffer: GrayImage,
    /// Whether the mask affects compositing.
    pub apply: bool,
    /// Whether the mask is shown instead of the layer.
    pub show: bool,
    /// Whether painting goes to the mask instead of the layer.
    pub edit: bool,
}

impl LayerMask {
    pub fn new(buffer: GrayImage) -> Self {
        Self {
            buffer,
            apply: true,
            show: false,
            edit: true,
        }
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self::new(GrayImage::from_pixel(width, height, Luma([value])))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn invert(&mut self) {
        for p in self.buffer.pixels_mut() {
            p.0[0] = 255 - p.0[0];
        }
    }

    /// Mask value at a point in layer coordinates.
    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.buffer.get_pixel(x, y).0[0]
    }
}

/// Initial content of a new layer mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddMaskType {
    /// Full opacity.
    #[default]
    White,
    /// Full transparency.
    Black,
    /// The layer's alpha channel.
    Alpha,
    /// The layer's alpha channel, after which the layer becomes opaque.
    AlphaTransfer,
    /// The image selection.
    Selection,
    /// A grayscale copy of the layer.
    Copy,
    /// An image channel.
    Channel,
}

impl AddMaskType {
    pub const ALL: [AddMaskType; 7] = [
        AddMaskType::White,
        AddMaskType::Black,
        AddMaskType::Alpha,
        AddMaskType::AlphaTransfer,
        AddMaskType::Selection,
        AddMaskType::Copy,
        AddMaskType::Channel,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// What happens to a mask when it is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskApplyMode {
    /// Multiply the mask into the layer's alpha.
    Apply,
    /// Drop the mask, leaving the layer as it was.
    Discard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mask_flags() {
        let mask = LayerMask::filled(3, 2, 255);
        assert!(mask.apply);
        assert!(mask.edit);
        assert!(!mask.show);
        assert_eq!((mask.width(), mask.height()), (3, 2));
    }

    #[test]
    fn test_invert() {
        let mut mask = LayerMask::filled(2, 2, 200);
        mask.invert();
        assert_eq!(mask.value(1, 1), 55);
    }

    #[test]
    fn test_add_mask_type_index() {
        assert_eq!(AddMaskType::from_index(0), Some(AddMaskType::White));
        assert_eq!(AddMaskType::from_index(6), Some(AddMaskType::Channel));
        assert_eq!(AddMaskType::from_index(7), None);
    }
}
