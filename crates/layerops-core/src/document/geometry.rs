//! Resizing and scaling layers, and the document's [`GeometryHost`] side.

use super::{Document, LayerId};
use crate::buffer::{
    self, auto_shrink, auto_shrink_gray, resize_canvas, resize_gray, scale_gray, scaled_length,
    ContentBounds, Interpolation, TRANSPARENT,
};
use crate::error::CommandError;
use crate::geometry::{GeometryHost, ItemRef};
use crate::progress::Progress;
use crate::undo::UndoKind;

impl Document {
    /// Change the canvas of a layer without resampling.
    ///
    /// The old content lands at `(offset_x, offset_y)` in the new canvas and
    /// the layer moves so the content keeps its place in the image. The mask
    /// is resized along, filling new area with black. A layer without alpha
    /// gains alpha when new area is exposed.
    pub fn resize_layer(
        &mut self,
        id: LayerId,
        width: u32,
        height: u32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), CommandError> {
        let layer = self.content.require(id)?;
        if !layer.kind.can_resize() {
            return Err(CommandError::rejected("Cannot resize a layer group."));
        }

        let (old_w, old_h) = (layer.width() as i64, layer.height() as i64);
        let exposes_new_area = offset_x > 0
            || offset_y > 0
            || offset_x as i64 + old_w < width as i64
            || offset_y as i64 + old_h < height as i64;
        let gains_alpha = !layer.has_alpha && exposes_new_area;

        let buffer = resize_canvas(&layer.buffer, width, height, offset_x, offset_y, TRANSPARENT)?;
        let mask = layer
            .mask
            .as_ref()
            .map(|m| resize_gray(&m.buffer, width, height, offset_x, offset_y, 0))
            .transpose()?;

        self.push_undo(UndoKind::ItemResize, "Resize Layer", Some(id));
        let layer = self.content.require_mut(id)?;
        layer.buffer = buffer;
        if let (Some(mask), Some(resized)) = (layer.mask.as_mut(), mask) {
            mask.buffer = resized;
        }
        layer.offset = (
            layer.offset.0.saturating_sub(offset_x),
            layer.offset.1.saturating_sub(offset_y),
        );
        if gains_alpha {
            layer.has_alpha = true;
        }
        self.dirty = true;
        tracing::debug!(layer = %id, width, height, offset_x, offset_y, "layer resized");
        Ok(())
    }

    /// Resample a layer to `width` x `height`, keeping its center in place.
    ///
    /// A group scales every layer inside it relative to the group bounds.
    /// `progress` receives one value per scaled layer.
    pub fn scale_layer(
        &mut self,
        id: LayerId,
        width: u32,
        height: u32,
        interpolation: Interpolation,
        progress: &mut dyn Progress,
    ) -> Result<(), CommandError> {
        if width == 0 || height == 0 {
            return Err(CommandError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        let (x, y, old_w, old_h) = self.content.bounds(id).ok_or(CommandError::NoSuchLayer(id))?;
        let new_x = centered(x, old_w, width);
        let new_y = centered(y, old_h, height);
        let fx = width as f64 / old_w as f64;
        let fy = height as f64 / old_h as f64;

        let is_group = self.content.require(id)?.is_group();
        let targets: Vec<LayerId> = if is_group {
            self.content
                .descendants(id)
                .into_iter()
                .filter(|&d| self.content.layer(d).is_some_and(|l| !l.is_group()))
                .collect()
        } else {
            vec![id]
        };

        let total = targets.len().max(1) as f64;
        let mut scaled = Vec::with_capacity(targets.len());
        for (done, &target) in targets.iter().enumerate() {
            let leaf = self.content.require(target)?;
            let (w, h, offset) = if target == id {
                (width, height, (new_x, new_y))
            } else {
                (
                    scaled_length(leaf.width(), fx),
                    scaled_length(leaf.height(), fy),
                    (
                        new_x + ((leaf.offset.0 - x) as f64 * fx).round() as i32,
                        new_y + ((leaf.offset.1 - y) as f64 * fy).round() as i32,
                    ),
                )
            };
            let pixels = buffer::scale(&leaf.buffer, w, h, interpolation)?;
            let mask = leaf
                .mask
                .as_ref()
                .map(|m| scale_gray(&m.buffer, w, h, interpolation))
                .transpose()?;
            scaled.push((target, pixels, mask, offset));
            progress.set_value((done + 1) as f64 / total);
        }

        self.push_undo(UndoKind::ItemScale, "Scale Layer", Some(id));
        for (target, pixels, mask, offset) in scaled {
            let leaf = self.content.require_mut(target)?;
            leaf.buffer = pixels;
            if let (Some(current), Some(resized)) = (leaf.mask.as_mut(), mask) {
                current.buffer = resized;
            }
            leaf.offset = offset;
        }
        if is_group {
            self.content.require_mut(id)?.offset = (new_x, new_y);
        }
        self.dirty = true;
        tracing::debug!(layer = %id, width, height, ?interpolation, "layer scaled");
        Ok(())
    }

    /// Resize a layer's canvas to the image bounds.
    pub fn resize_layer_to_image(&mut self, id: LayerId) -> Result<(), CommandError> {
        let (off_x, off_y) = self.content.require(id)?.offset;
        let (width, height) = (self.content.width, self.content.height);

        self.undo_group_start(UndoKind::ItemResize, "Layer to Image Size");
        let result = self.resize_layer(id, width, height, off_x, off_y);
        self.undo_group_end();
        result
    }
}

/// New origin that keeps a span of `old` centered after it becomes `new`.
fn centered(origin: i32, old: u32, new: u32) -> i32 {
    (origin as i64 - (new as i64 - old as i64) / 2) as i32
}

impl GeometryHost for Document {
    fn item_size(&self, item: ItemRef) -> Result<(u32, u32), CommandError> {
        let id = item.layer();
        match item {
            ItemRef::Layer(_) => {
                let (_, _, w, h) = self.content.bounds(id).ok_or(CommandError::NoSuchLayer(id))?;
                Ok((w, h))
            }
            ItemRef::Mask(_) => {
                let mask = self.require_mask(id)?;
                Ok((mask.width(), mask.height()))
            }
        }
    }

    fn item_offset(&self, item: ItemRef) -> Result<(i32, i32), CommandError> {
        let id = item.layer();
        let (x, y, _, _) = self.content.bounds(id).ok_or(CommandError::NoSuchLayer(id))?;
        Ok((x, y))
    }

    fn content_bounds(&self, item: ItemRef) -> Result<ContentBounds, CommandError> {
        let id = item.layer();
        let layer = self.content.require(id)?;
        match item {
            ItemRef::Mask(_) => Ok(auto_shrink_gray(&self.require_mask(id)?.buffer)),
            ItemRef::Layer(_) if layer.is_group() => {
                let (rendered, _) = self.content.render_group(id).ok_or(CommandError::NoSuchLayer(id))?;
                Ok(auto_shrink(&rendered))
            }
            ItemRef::Layer(_) => Ok(auto_shrink(&layer.buffer)),
        }
    }

    fn resize_item(
        &mut self,
        item: ItemRef,
        width: u32,
        height: u32,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<(), CommandError> {
        self.resize_layer(item.layer(), width, height, offset_x, offset_y)
    }

    fn scale_item(
        &mut self,
        item: ItemRef,
        width: u32,
        height: u32,
        interpolation: Interpolation,
        progress: &mut dyn Progress,
    ) -> Result<(), CommandError> {
        self.scale_layer(item.layer(), width, height, interpolation, progress)
    }

    fn undo_group_start(&mut self, kind: UndoKind, label: &str) {
        Document::undo_group_start(self, kind, label);
    }

    fn undo_group_end(&mut self) {
        Document::undo_group_end(self);
    }

    fn flush(&mut self) {
        Document::flush(self);
    }
}

impl Document {
    fn require_mask(&self, id: LayerId) -> Result<&super::LayerMask, CommandError> {
        self.content
            .require(id)?
            .mask
            .as_ref()
            .ok_or_else(|| CommandError::rejected("The layer has no mask."))
    }
}
