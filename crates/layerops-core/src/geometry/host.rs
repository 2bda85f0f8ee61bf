use serde::{Deserialize, Serialize};

use crate::buffer::{ContentBounds, Interpolation};
use crate::document::LayerId;
use crate::error::CommandError;
use crate::progress::Progress;
use crate::undo::UndoKind;

/// A drawable that geometry changes can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "layer")]
pub enum ItemRef {
    Layer(LayerId),
    /// The mask attached to a layer.
    Mask(LayerId),
}

impl ItemRef {
    /// The layer the item belongs to.
    pub fn layer(self) -> LayerId {
        match self {
            ItemRef::Layer(id) | ItemRef::Mask(id) => id,
        }
    }

    pub fn is_mask(self) -> bool {
        matches!(self, ItemRef::Mask(_))
    }
}

/// The document side of a geometry change.
///
/// Implementations apply one primitive mutation per call and leave undo
/// grouping and flushing to the caller.
pub trait GeometryHost {
    /// Current width and height of the item.
    fn item_size(&self, item: ItemRef) -> Result<(u32, u32), CommandError>;

    /// Position of the item's top-left corner in image coordinates.
    fn item_offset(&self, item: ItemRef) -> Result<(i32, i32), CommandError>;

    /// Bounding box of the item's non-transparent content.
    fn content_bounds(&self, item: ItemRef) -> Result<ContentBounds, CommandError>;

    /// Change the canvas of the item, placing the old content at
    /// `(offset_x, offset_y)` inside the new bounds.
    fn resize_item(
        &mut self,
        item: ItemRef,
        width: u32,
        height: u32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), CommandError>;

    /// Resample the item to `width` x `height` around its center.
    fn scale_item(
        &mut self,
        item: ItemRef,
        width: u32,
        height: u32,
        interpolation: Interpolation,
        progress: &mut dyn Progress,
    ) -> Result<(), CommandError>;

    fn undo_group_start(&mut self, kind: UndoKind, label: &str);

    fn undo_group_end(&mut self);

    /// Publish pending changes to observers.
    fn flush(&mut self);
}
