//! Layers and what kind of content they carry.

use serde::{Deserialize, Serialize};

use super::{LayerId, LayerMask, LayerMode};
use crate::buffer::{PixelBuffer, Rgba};

/// Text attached to a text layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInfo {
    pub text: String,
    /// Whether the layer name follows the text.
    pub auto_rename: bool,
}

/// The closed set of layer kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Plain,
    Text(TextInfo),
    Group,
}

impl LayerKind {
    /// Groups take their bounds from their children and cannot be resized.
    pub fn can_resize(&self) -> bool {
        !self.is_group()
    }

    /// Whether the layer owns pixel data of its own.
    pub fn has_pixels(&self) -> bool {
        !self.is_group()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, LayerKind::Text(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, LayerKind::Group)
    }
}

/// What a floating selection is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatingTarget {
    /// The pixels of a layer.
    Layer(LayerId),
    /// The mask of a layer.
    Mask(LayerId),
}

impl FloatingTarget {
    pub fn layer(self) -> LayerId {
        match self {
            FloatingTarget::Layer(id) | FloatingTarget::Mask(id) => id,
        }
    }
}

/// How a new layer is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillType {
    Foreground,
    Background,
    White,
    #[default]
    Transparent,
}

impl FillType {
    /// The fill color given the current paint colors.
    pub fn color(self, foreground: Rgba, background: Rgba) -> Rgba {
        match self {
            FillType::Foreground => foreground,
            FillType::Background => background,
            FillType::White => [255, 255, 255, 255],
            FillType::Transparent => crate::buffer::TRANSPARENT,
        }
    }
}

/// A layer in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    /// Owning group, `None` for top-level layers.
    pub parent: Option<LayerId>,
    pub name: String,
    pub kind: LayerKind,
    /// Pixel content. Unused for groups.
    pub buffer: PixelBuffer,
    /// Position of the buffer's top-left corner in image coordinates.
    pub offset: (i32, i32),
    /// Opacity in `0.0..=1.0`.
    pub opacity: f64,
    pub mode: LayerMode,
    pub visible: bool,
    pub lock_alpha: bool,
    pub has_alpha: bool,
    pub mask: Option<LayerMask>,
    /// Set when this layer is a floating selection.
    pub floating: Option<FloatingTarget>,
}

impl Layer {
    /// A transparent plain layer.
    pub fn new(id: LayerId, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::from_buffer(id, name, PixelBuffer::transparent(width, height))
    }

    /// A plain layer wrapping existing pixels.
    pub fn from_buffer(id: LayerId, name: impl Into<String>, buffer: PixelBuffer) -> Self {
        Self {
            id,
            parent: None,
            name: name.into(),
            kind: LayerKind::Plain,
            buffer,
            offset: (0, 0),
            opacity: 1.0,
            mode: LayerMode::Normal,
            visible: true,
            lock_alpha: false,
            has_alpha: true,
            mask: None,
            floating: None,
        }
    }

    /// An empty layer group.
    pub fn group(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            kind: LayerKind::Group,
            ..Self::new(id, name, 1, 1)
        }
    }

    /// A text layer showing pre-rendered text pixels. The name follows the
    /// text until the layer is renamed.
    pub fn text(id: LayerId, text: impl Into<String>, buffer: PixelBuffer) -> Self {
        let text = text.into();
        Self {
            kind: LayerKind::Text(TextInfo {
                text: text.clone(),
                auto_rename: true,
            }),
            ..Self::from_buffer(id, text, buffer)
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_mode(mut self, mode: LayerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    pub fn is_floating(&self) -> bool {
        self.floating.is_some()
    }

    pub fn is_group(&self) -> bool {
        self.kind.is_group()
    }

    /// Fill the whole buffer. Layers without alpha stay opaque.
    pub fn fill(&mut self, color: Rgba) {
        let color = if self.has_alpha {
            color
        } else {
            [color[0], color[1], color[2], 255]
        };
        self.buffer = PixelBuffer::filled(self.buffer.width, self.buffer.height, color);
    }

    /// Whether a point in image coordinates falls on this layer's buffer.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (ox, oy) = self.offset;
        x >= ox
            && y >= oy
            && (x as i64) < ox as i64 + self.buffer.width as i64
            && (y as i64) < oy as i64 + self.buffer.height as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_capabilities() {
        assert!(LayerKind::Plain.can_resize());
        assert!(LayerKind::Plain.has_pixels());
        assert!(!LayerKind::Group.can_resize());
        assert!(!LayerKind::Group.has_pixels());

        let text = LayerKind::Text(TextInfo {
            text: "Hello".into(),
            auto_rename: true,
        });
        assert!(text.is_text());
        assert!(text.can_resize());
    }

    #[test]
    fn test_text_layer_named_after_text() {
        let layer = Layer::text(LayerId(1), "Hello", PixelBuffer::transparent(4, 2));
        assert_eq!(layer.name, "Hello");
        assert!(matches!(layer.kind, LayerKind::Text(TextInfo { auto_rename: true, .. })));
    }

    #[test]
    fn test_group_defaults() {
        let group = Layer::group(LayerId(2), "Group");
        assert!(group.is_group());
        assert_eq!((group.width(), group.height()), (1, 1));
    }

    #[test]
    fn test_fill_without_alpha_stays_opaque() {
        let mut layer = Layer::new(LayerId(1), "Background", 2, 2);
        layer.has_alpha = false;
        layer.fill([10, 20, 30, 0]);
        assert_eq!(layer.buffer.pixel(1, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn test_fill_type_colors() {
        let fg = [1, 2, 3, 255];
        let bg = [4, 5, 6, 255];
        assert_eq!(FillType::Foreground.color(fg, bg), fg);
        assert_eq!(FillType::Background.color(fg, bg), bg);
        assert_eq!(FillType::White.color(fg, bg), [255, 255, 255, 255]);
        assert_eq!(FillType::Transparent.color(fg, bg)[3], 0);
    }

    #[test]
    fn test_contains() {
        let layer = Layer::new(LayerId(1), "L", 10, 5).with_offset(-2, 3);
        assert!(layer.contains(-2, 3));
        assert!(layer.contains(7, 7));
        assert!(!layer.contains(8, 3));
        assert!(!layer.contains(0, 8));
    }
}
