//! In-memory image document: the layer tree, masks, channels and selection,
//! plus the undo history over all of it.
//!
//! Layers live in one flat list linked into a tree by parent ids. Siblings
//! keep their relative list order, with the first sibling on top.
//!
//! Mutating methods push their own undo step and mark the document dirty;
//! [`Document::flush`] is the single "changes are done, redraw" signal.

mod composite;
mod geometry;
mod layer;
mod mask;
mod mode;
mod ops;
mod selection;
mod stack;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use layer::{FillType, FloatingTarget, Layer, LayerKind, TextInfo};
pub use mask::{AddMaskType, LayerMask, MaskApplyMode};
pub use mode::LayerMode;
pub use selection::{Channel, ChannelOp, Selection};
pub use stack::Placement;

use crate::buffer::{BufferError, Rgba};
use crate::error::CommandError;
use crate::undo::{UndoKind, UndoStack, DEFAULT_MAX_UNDO_LEVELS};

/// Resolution of new documents, in pixels per inch.
pub const DEFAULT_RESOLUTION: f64 = 72.0;

/// Identifier of a layer, unique within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything undo restores.
#[derive(Debug, Clone, PartialEq)]
struct Content {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    active_layer: Option<LayerId>,
    channels: Vec<Channel>,
    active_channel: Option<usize>,
    selection: Selection,
}

/// An image made of layers.
#[derive(Debug, Clone)]
pub struct Document {
    content: Content,
    history: UndoStack<Content>,
    next_id: u32,
    resolution: f64,
    background: Rgba,
    dirty: bool,
    generation: u64,
}

impl Document {
    /// An empty document.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::InvalidDimensions` when either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        Self::with_history(width, height, DEFAULT_MAX_UNDO_LEVELS)
    }

    /// An empty document keeping at most `max_undo_levels` undo steps.
    pub fn with_history(width: u32, height: u32, max_undo_levels: usize) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        Ok(Self {
            content: Content {
                width,
                height,
                layers: Vec::new(),
                active_layer: None,
                channels: Vec::new(),
                active_channel: None,
                selection: Selection::none(width, height),
            },
            history: UndoStack::new(max_undo_levels),
            next_id: 1,
            resolution: DEFAULT_RESOLUTION,
            background: [255, 255, 255, 255],
            dirty: false,
            generation: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.content.width
    }

    pub fn height(&self) -> u32 {
        self.content.height
    }

    /// Pixels per inch, used to convert physical units.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn set_resolution(&mut self, dpi: f64) {
        if dpi.is_finite() && dpi > 0.0 {
            self.resolution = dpi;
        }
    }

    /// Color that shows through where a layer loses its alpha.
    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn set_background(&mut self, color: Rgba) {
        self.background = color;
    }

    /// A fresh layer id. Ids are never reused, even across undo.
    pub fn new_layer_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.content.layer(id)
    }

    /// All layers in list order.
    pub fn layers(&self) -> &[Layer] {
        &self.content.layers
    }

    pub fn layer_count(&self) -> usize {
        self.content.layers.len()
    }

    /// Children of `parent` (top level for `None`), topmost first.
    pub fn children(&self, parent: Option<LayerId>) -> Vec<LayerId> {
        self.content.children(parent)
    }

    pub fn active_layer_id(&self) -> Option<LayerId> {
        self.content.active_layer
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.content.active_layer.and_then(|id| self.content.layer(id))
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<(), CommandError> {
        self.content.require(id)?;
        self.content.active_layer = Some(id);
        Ok(())
    }

    /// The floating selection, if there is one.
    pub fn floating_selection(&self) -> Option<&Layer> {
        self.content.layers.iter().find(|l| l.is_floating())
    }

    pub fn selection(&self) -> &Selection {
        &self.content.selection
    }

    pub fn channels(&self) -> &[Channel] {
        &self.content.channels
    }

    pub fn active_channel(&self) -> Option<usize> {
        self.content.active_channel
    }

    pub fn set_active_channel(&mut self, index: Option<usize>) {
        self.content.active_channel = index.filter(|&i| i < self.content.channels.len());
    }

    /// Add an image channel. Channels of the wrong size are rejected.
    pub fn add_channel(&mut self, channel: Channel) -> Result<usize, CommandError> {
        if channel.buffer.dimensions() != (self.content.width, self.content.height) {
            return Err(CommandError::rejected("Channel size does not match the image."));
        }
        self.push_undo(UndoKind::SelectionChange, "Add Channel", None);
        self.content.channels.push(channel);
        self.dirty = true;
        Ok(self.content.channels.len() - 1)
    }

    /// Replace the selection.
    pub fn set_selection(&mut self, selection: Selection) -> Result<(), CommandError> {
        if selection.mask().dimensions() != (self.content.width, self.content.height) {
            return Err(CommandError::rejected("Selection size does not match the image."));
        }
        self.push_undo(UndoKind::SelectionChange, "Selection", None);
        self.content.selection = selection;
        self.dirty = true;
        Ok(())
    }

    /// Whether there are changes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Incremented on every flush.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal that a command finished changing the document.
    pub fn flush(&mut self) {
        self.generation += 1;
        self.dirty = false;
        tracing::trace!(generation = self.generation, "document flushed");
    }

    pub fn undo_group_start(&mut self, kind: UndoKind, label: &str) {
        self.history.group_start(kind, label, &self.content);
    }

    pub fn undo_group_end(&mut self) {
        self.history.group_end();
    }

    /// Whether the newest undo step is a `kind` change to `layer`.
    pub fn can_compress_undo(&self, kind: UndoKind, layer: LayerId) -> bool {
        self.history.can_compress(kind, layer)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_labels(&self) -> Vec<String> {
        self.history.undo_labels()
    }

    /// Step back in history. Returns the label of the undone step.
    pub fn undo(&mut self) -> Option<String> {
        let (restored, label) = self.history.undo(self.content.clone())?;
        self.content = restored;
        self.dirty = true;
        tracing::debug!(label = %label, "undo");
        Some(label)
    }

    /// Step forward in history. Returns the label of the redone step.
    pub fn redo(&mut self) -> Option<String> {
        let (restored, label) = self.history.redo(self.content.clone())?;
        self.content = restored;
        self.dirty = true;
        tracing::debug!(label = %label, "redo");
        Some(label)
    }

    fn push_undo(&mut self, kind: UndoKind, label: &str, item: Option<LayerId>) {
        self.history.push(kind, label, item, &self.content);
    }
}
