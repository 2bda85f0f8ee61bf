//! Undoable document operations.
//!
//! Each operation validates first, then pushes one undo step (absorbed by
//! an open undo group) and marks the document dirty. Nothing here flushes;
//! that is left to the command that called it.

use image::{GrayImage, Luma};

use super::composite::{composite, composite_gray};
use super::{
    AddMaskType, ChannelOp, Document, FloatingTarget, Layer, LayerId, LayerKind, LayerMask,
    LayerMode, MaskApplyMode, Placement,
};
use crate::buffer::{luminance, resize_gray, PixelBuffer, Rgba};
use crate::error::CommandError;
use crate::geometry::ItemRef;
use crate::undo::UndoKind;

impl Document {
    /// Add a layer to the tree and make it active.
    ///
    /// The name is made unique among the new siblings.
    pub fn add_layer(&mut self, mut layer: Layer, placement: Placement) -> Result<LayerId, CommandError> {
        let id = layer.id;
        if self.content.layer(id).is_some() {
            return Err(CommandError::rejected(format!(
                "Layer {id} is already part of the image."
            )));
        }
        let (parent, position) = self.content.resolve_placement(placement)?;
        layer.name = self.content.unique_name(parent, &layer.name);

        self.push_undo(UndoKind::LayerAdd, "Add Layer", Some(id));
        self.next_id = self.next_id.max(id.0 + 1);
        self.content.insert(layer, parent, position);
        self.content.active_layer = Some(id);
        self.dirty = true;
        tracing::debug!(layer = %id, ?parent, position, "layer added");
        Ok(id)
    }

    /// Remove a layer together with everything inside it.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), CommandError> {
        let layer = self.content.require(id)?;
        let floating_target = layer.floating;
        let successor = self.content.successor(id);

        let mut doomed = self.content.descendants(id);
        doomed.push(id);
        // A floating selection cannot outlive what it floats over
        let orphaned: Vec<LayerId> = self
            .content
            .layers
            .iter()
            .filter(|l| l.floating.is_some_and(|t| doomed.contains(&t.layer())))
            .map(|l| l.id)
            .collect();

        self.push_undo(UndoKind::LayerRemove, "Remove Layer", Some(id));
        self.content.remove_subtree(id);
        for floating in &orphaned {
            self.content.remove_subtree(*floating);
        }

        let active_gone = self
            .content
            .active_layer
            .is_some_and(|a| self.content.layer(a).is_none());
        if active_gone {
            self.content.active_layer = floating_target
                .map(FloatingTarget::layer)
                .or(successor)
                .filter(|&a| self.content.layer(a).is_some());
        }
        self.dirty = true;
        tracing::debug!(layer = %id, "layer removed");
        Ok(())
    }

    /// Move a layer one step up among its siblings.
    pub fn raise_layer(&mut self, id: LayerId) -> Result<(), CommandError> {
        let (_, position) = self.position(id)?;
        if position == 0 {
            return Err(CommandError::rejected("Layer cannot be raised higher."));
        }
        self.push_undo(UndoKind::LayerReposition, "Raise Layer", Some(id));
        self.content.reorder(id, position - 1)?;
        self.dirty = true;
        Ok(())
    }

    /// Move a layer one step down among its siblings.
    pub fn lower_layer(&mut self, id: LayerId) -> Result<(), CommandError> {
        let (parent, position) = self.position(id)?;
        if position + 1 >= self.content.children(parent).len() {
            return Err(CommandError::rejected("Layer cannot be lowered more."));
        }
        self.push_undo(UndoKind::LayerReposition, "Lower Layer", Some(id));
        self.content.reorder(id, position + 1)?;
        self.dirty = true;
        Ok(())
    }

    /// Move a layer to the top of its siblings. Already on top is a no-op.
    pub fn raise_layer_to_top(&mut self, id: LayerId) -> Result<(), CommandError> {
        let (_, position) = self.position(id)?;
        if position == 0 {
            return Ok(());
        }
        self.push_undo(UndoKind::LayerReposition, "Raise Layer to Top", Some(id));
        self.content.reorder(id, 0)?;
        self.dirty = true;
        Ok(())
    }

    /// Move a layer to the bottom of its siblings. Already at the bottom is
    /// a no-op.
    pub fn lower_layer_to_bottom(&mut self, id: LayerId) -> Result<(), CommandError> {
        let (parent, position) = self.position(id)?;
        if position + 1 >= self.content.children(parent).len() {
            return Ok(());
        }
        self.push_undo(UndoKind::LayerReposition, "Lower Layer to Bottom", Some(id));
        self.content.reorder(id, usize::MAX)?;
        self.dirty = true;
        Ok(())
    }

    fn position(&self, id: LayerId) -> Result<(Option<LayerId>, usize), CommandError> {
        self.content
            .sibling_position(id)
            .ok_or(CommandError::NoSuchLayer(id))
    }

    /// Copy a layer, groups including their contents, and place the copy
    /// above the original in the same parent.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Result<LayerId, CommandError> {
        let source = self.content.require(id)?.clone();
        let descendants: Vec<Layer> = self
            .content
            .descendants(id)
            .into_iter()
            .filter_map(|d| self.content.layer(d).cloned())
            .collect();

        let (parent, position) = self.content.resolve_placement(Placement::Parent(source.parent))?;
        let copy_id = self.new_layer_id();
        let mut copy = source.clone();
        copy.id = copy_id;
        copy.floating = None;
        copy.name = self.content.unique_name(parent, &format!("{} copy", source.name));

        let mut id_map = vec![(id, copy_id)];
        let mut copies = Vec::with_capacity(descendants.len());
        for mut child in descendants {
            let new_id = self.new_layer_id();
            id_map.push((child.id, new_id));
            let new_parent = child
                .parent
                .and_then(|p| id_map.iter().find(|(old, _)| *old == p).map(|(_, new)| *new));
            child.id = new_id;
            copies.push((child, new_parent));
        }

        self.push_undo(UndoKind::LayerAdd, "Duplicate Layer", Some(copy_id));
        self.content.insert(copy, parent, position);
        for (child, new_parent) in copies {
            self.content.insert(child, new_parent, usize::MAX);
        }
        self.content.active_layer = Some(copy_id);
        self.dirty = true;
        tracing::debug!(layer = %id, copy = %copy_id, "layer duplicated");
        Ok(copy_id)
    }

    /// Merge a layer into the next visible sibling below it. The result
    /// grows to cover both layers and keeps the lower layer's name, opacity
    /// and mode.
    pub fn merge_down(&mut self, id: LayerId) -> Result<LayerId, CommandError> {
        let upper = self.content.require(id)?;
        if upper.is_floating() {
            return Err(CommandError::rejected("Cannot merge down a floating selection."));
        }
        let (parent, position) = self.position(id)?;
        let lower_id = self
            .content
            .children(parent)
            .into_iter()
            .skip(position + 1)
            .find(|&s| self.content.layer(s).is_some_and(|l| l.visible))
            .ok_or_else(|| CommandError::rejected("There is no visible layer to merge down to."))?;

        let lower = self.content.require(lower_id)?;
        if lower.is_group() {
            return Err(CommandError::rejected("Cannot merge down to a layer group."));
        }

        let (ux, uy, uw, uh) = self.content.bounds(id).ok_or(CommandError::NoSuchLayer(id))?;
        let (lx, ly, lw, lh) = (lower.offset.0, lower.offset.1, lower.width(), lower.height());
        let x0 = ux.min(lx);
        let y0 = uy.min(ly);
        let x1 = (ux as i64 + uw as i64).max(lx as i64 + lw as i64);
        let y1 = (uy as i64 + uh as i64).max(ly as i64 + lh as i64);
        let mut canvas = PixelBuffer::transparent((x1 - x0 as i64) as u32, (y1 - y0 as i64) as u32);

        let lower_mask = lower.mask.as_ref().filter(|m| m.apply).map(|m| &m.buffer);
        composite(&mut canvas, &lower.buffer, (lx - x0, ly - y0), 1.0, LayerMode::Normal, lower_mask);

        let upper = self.content.require(id)?;
        if upper.is_group() {
            if let Some((buffer, (gx, gy))) = self.content.render_group(id) {
                composite(&mut canvas, &buffer, (gx - x0, gy - y0), upper.opacity, upper.mode, None);
            }
        } else {
            let upper_mask = upper.mask.as_ref().filter(|m| m.apply).map(|m| &m.buffer);
            composite(
                &mut canvas,
                &upper.buffer,
                (ux - x0, uy - y0),
                upper.opacity,
                upper.mode,
                upper_mask,
            );
        }

        let mut merged = lower.clone();
        merged.id = self.new_layer_id();
        merged.kind = LayerKind::Plain;
        merged.buffer = canvas;
        merged.offset = (x0, y0);
        merged.mask = None;
        merged.has_alpha = true;
        let merged_id = merged.id;

        self.push_undo(UndoKind::LayersMerge, "Merge Down", Some(merged_id));
        if let Some(slot) = self.content.layers.iter_mut().find(|l| l.id == lower_id) {
            *slot = merged;
        }
        self.content.remove_subtree(id);
        self.content.active_layer = Some(merged_id);
        self.dirty = true;
        tracing::debug!(upper = %id, lower = %lower_id, merged = %merged_id, "merged down");
        Ok(merged_id)
    }

    /// Flatten a layer group into a single plain layer.
    pub fn merge_group(&mut self, id: LayerId) -> Result<LayerId, CommandError> {
        let group = self.content.require(id)?;
        if !group.is_group() {
            return Err(CommandError::rejected("Only layer groups can be merged."));
        }
        let (buffer, offset) = self.content.render_group(id).ok_or(CommandError::NoSuchLayer(id))?;

        let mut merged = Layer::from_buffer(LayerId(0), group.name.clone(), buffer);
        merged.offset = offset;
        merged.opacity = group.opacity;
        merged.mode = group.mode;
        merged.visible = group.visible;
        merged.parent = group.parent;
        merged.id = self.new_layer_id();
        let merged_id = merged.id;
        let descendants = self.content.descendants(id);

        self.push_undo(UndoKind::LayersMerge, "Merge Layer Group", Some(merged_id));
        if let Some(slot) = self.content.layers.iter_mut().find(|l| l.id == id) {
            *slot = merged;
        }
        self.content.layers.retain(|l| !descendants.contains(&l.id));
        self.content.active_layer = Some(merged_id);
        self.dirty = true;
        tracing::debug!(group = %id, merged = %merged_id, "group merged");
        Ok(merged_id)
    }

    /// Float pixels over a layer or its mask, as a paste does. The floating
    /// selection goes on top of the stack and becomes active.
    pub fn float_buffer(
        &mut self,
        buffer: PixelBuffer,
        offset: (i32, i32),
        target: FloatingTarget,
    ) -> Result<LayerId, CommandError> {
        if self.floating_selection().is_some() {
            return Err(CommandError::rejected("There is already a floating selection."));
        }
        let owner = self.content.require(target.layer())?;
        if owner.is_group() {
            return Err(CommandError::rejected("Cannot paste into a layer group."));
        }
        if matches!(target, FloatingTarget::Mask(_)) && owner.mask.is_none() {
            return Err(CommandError::rejected(format!(
                "Layer {} has no layer mask.",
                target.layer()
            )));
        }

        let mut layer = Layer::from_buffer(self.new_layer_id(), "Floating Selection", buffer);
        layer.offset = offset;
        layer.floating = Some(target);
        let id = layer.id;

        self.push_undo(UndoKind::EditPaste, "Paste", Some(id));
        self.content.insert(layer, None, 0);
        self.content.active_layer = Some(id);
        self.dirty = true;
        Ok(id)
    }

    /// Composite a floating selection into what it floats over and remove
    /// it.
    pub fn anchor_floating(&mut self, id: LayerId) -> Result<(), CommandError> {
        let floating = self.content.require(id)?;
        let target = floating
            .floating
            .ok_or_else(|| CommandError::rejected("The layer is not a floating selection."))?;
        self.content.require(target.layer())?;

        self.push_undo(UndoKind::FloatingAnchor, "Anchor Floating Selection", Some(id));
        let Some(floating) = self.content.remove_subtree(id).pop() else {
            return Err(CommandError::NoSuchLayer(id));
        };
        let owner = self.content.require_mut(target.layer())?;
        let offset = (
            floating.offset.0 - owner.offset.0,
            floating.offset.1 - owner.offset.1,
        );
        match target {
            FloatingTarget::Layer(_) => {
                composite(
                    &mut owner.buffer,
                    &floating.buffer,
                    offset,
                    floating.opacity,
                    floating.mode,
                    None,
                );
                if !owner.has_alpha {
                    owner.buffer.make_opaque();
                }
            }
            FloatingTarget::Mask(_) => {
                if let Some(mask) = owner.mask.as_mut() {
                    composite_gray(&mut mask.buffer, &floating.buffer, offset, floating.opacity);
                }
            }
        }
        self.content.active_layer = Some(target.layer());
        self.dirty = true;
        tracing::debug!(floating = %id, target = ?target, "floating selection anchored");
        Ok(())
    }

    /// Turn a floating selection into an ordinary layer.
    pub fn floating_to_layer(&mut self, id: LayerId) -> Result<(), CommandError> {
        let floating = self.content.require(id)?.floating;
        match floating {
            None => Err(CommandError::rejected("The layer is not a floating selection.")),
            Some(FloatingTarget::Mask(_)) => Err(CommandError::rejected(
                "Cannot create a new layer from the floating selection because it belongs to a layer mask or channel.",
            )),
            Some(FloatingTarget::Layer(_)) => {
                self.push_undo(UndoKind::FloatingToLayer, "Floating Selection to Layer", Some(id));
                let layer = self.content.require_mut(id)?;
                layer.floating = None;
                layer.name = "Pasted Layer".to_string();
                self.dirty = true;
                Ok(())
            }
        }
    }

    /// Rename a layer. Renaming a text layer stops its name from following
    /// the text.
    pub fn rename_layer(&mut self, id: LayerId, name: &str) -> Result<(), CommandError> {
        let layer = self.content.require(id)?;
        if layer.name == name {
            return Ok(());
        }
        if name.trim().is_empty() {
            return Err(CommandError::rejected("Layer name cannot be empty."));
        }
        if self.content.sibling_has_name(layer.parent, name, Some(id)) {
            return Err(CommandError::rejected(format!(
                "A layer named \"{name}\" already exists."
            )));
        }

        self.push_undo(UndoKind::ItemRename, "Rename Layer", Some(id));
        let layer = self.content.require_mut(id)?;
        layer.name = name.to_string();
        if let LayerKind::Text(info) = &mut layer.kind {
            info.auto_rename = false;
        }
        self.dirty = true;
        Ok(())
    }

    /// Set opacity, clamped to `0.0..=1.0`. With `push_undo` false the
    /// change folds into the newest undo step.
    pub fn set_opacity(&mut self, id: LayerId, opacity: f64, push_undo: bool) -> Result<(), CommandError> {
        let opacity = opacity.clamp(0.0, 1.0);
        if self.content.require(id)?.opacity == opacity {
            return Ok(());
        }
        if push_undo {
            self.push_undo(UndoKind::LayerOpacity, "Set Layer Opacity", Some(id));
        }
        self.content.require_mut(id)?.opacity = opacity;
        self.dirty = true;
        Ok(())
    }

    pub fn set_mode(&mut self, id: LayerId, mode: LayerMode, push_undo: bool) -> Result<(), CommandError> {
        if self.content.require(id)?.mode == mode {
            return Ok(());
        }
        if push_undo {
            self.push_undo(UndoKind::LayerMode, "Set Layer Mode", Some(id));
        }
        self.content.require_mut(id)?.mode = mode;
        self.dirty = true;
        Ok(())
    }

    pub fn set_lock_alpha(&mut self, id: LayerId, lock: bool, push_undo: bool) -> Result<(), CommandError> {
        if self.content.require(id)?.lock_alpha == lock {
            return Ok(());
        }
        if push_undo {
            let label = if lock {
                "Lock Alpha Channel"
            } else {
                "Unlock Alpha Channel"
            };
            self.push_undo(UndoKind::LayerLockAlpha, label, Some(id));
        }
        self.content.require_mut(id)?.lock_alpha = lock;
        self.dirty = true;
        Ok(())
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), CommandError> {
        if self.content.require(id)?.visible == visible {
            return Ok(());
        }
        self.push_undo(UndoKind::ItemVisibility, "Item Visibility", Some(id));
        self.content.require_mut(id)?.visible = visible;
        self.dirty = true;
        Ok(())
    }

    /// Set whether a text layer's name follows its text. Not undoable.
    pub fn set_text_auto_rename(&mut self, id: LayerId, auto_rename: bool) -> Result<(), CommandError> {
        match &mut self.content.require_mut(id)?.kind {
            LayerKind::Text(info) => {
                info.auto_rename = auto_rename;
                Ok(())
            }
            _ => Err(CommandError::rejected("The layer is not a text layer.")),
        }
    }

    /// Drop the text of a text layer, keeping its pixels. Returns false for
    /// layers that are not text layers.
    pub fn discard_text(&mut self, id: LayerId) -> Result<bool, CommandError> {
        if !self.content.require(id)?.kind.is_text() {
            return Ok(false);
        }
        self.push_undo(UndoKind::TextLayerModify, "Discard Text Information", Some(id));
        self.content.require_mut(id)?.kind = LayerKind::Plain;
        self.dirty = true;
        Ok(true)
    }

    /// Build a mask for a layer without attaching it.
    ///
    /// `AlphaTransfer` also makes the layer opaque, as its own undo step.
    pub fn create_mask(
        &mut self,
        id: LayerId,
        kind: AddMaskType,
        channel: Option<usize>,
    ) -> Result<LayerMask, CommandError> {
        let layer = self.content.require(id)?;
        if layer.is_group() {
            return Err(CommandError::rejected("Cannot add a layer mask to a layer group."));
        }
        let (w, h) = (layer.width(), layer.height());
        let (ox, oy) = layer.offset;
        let has_alpha = layer.has_alpha;
        let white = || GrayImage::from_pixel(w, h, Luma([255]));

        let buffer = match kind {
            AddMaskType::White => white(),
            AddMaskType::Black => GrayImage::new(w, h),
            AddMaskType::Alpha | AddMaskType::AlphaTransfer if has_alpha => {
                luminance::alpha_to_gray(&layer.buffer)
            }
            AddMaskType::Alpha | AddMaskType::AlphaTransfer => white(),
            AddMaskType::Selection => resize_gray(self.content.selection.mask(), w, h, -ox, -oy, 0)?,
            AddMaskType::Copy => luminance::to_gray(&layer.buffer),
            AddMaskType::Channel => {
                let channel = channel
                    .and_then(|i| self.content.channels.get(i))
                    .ok_or_else(|| CommandError::rejected("There is no channel to create the mask from."))?;
                resize_gray(&channel.buffer, w, h, -ox, -oy, 0)?
            }
        };

        if kind == AddMaskType::AlphaTransfer && has_alpha {
            self.push_undo(UndoKind::LayerAlpha, "Transfer Alpha to Mask", Some(id));
            self.content.require_mut(id)?.buffer.make_opaque();
            self.dirty = true;
        }
        Ok(LayerMask::new(buffer))
    }

    /// Attach a mask to a layer.
    pub fn add_mask(&mut self, id: LayerId, mask: LayerMask) -> Result<(), CommandError> {
        let layer = self.content.require(id)?;
        if layer.mask.is_some() {
            return Err(CommandError::rejected(
                "Unable to add a layer mask since the layer already has one.",
            ));
        }
        if layer.is_floating() {
            return Err(CommandError::rejected("Cannot add a layer mask to a floating selection."));
        }
        if layer.is_group() {
            return Err(CommandError::rejected("Cannot add a layer mask to a layer group."));
        }
        if (mask.width(), mask.height()) != (layer.width(), layer.height()) {
            return Err(CommandError::rejected(
                "Cannot add a layer mask of different dimensions than the layer.",
            ));
        }

        self.push_undo(UndoKind::LayerAddMask, "Add Layer Mask", Some(id));
        self.content.require_mut(id)?.mask = Some(mask);
        self.dirty = true;
        tracing::debug!(layer = %id, "layer mask added");
        Ok(())
    }

    /// Remove a layer's mask, either baking it into the alpha or dropping
    /// it. Returns false when the layer has no mask.
    pub fn apply_mask(&mut self, id: LayerId, mode: MaskApplyMode) -> Result<bool, CommandError> {
        if self.content.require(id)?.mask.is_none() {
            return Ok(false);
        }
        let label = match mode {
            MaskApplyMode::Apply => "Apply Layer Mask",
            MaskApplyMode::Discard => "Delete Layer Mask",
        };
        self.push_undo(UndoKind::LayerApplyMask, label, Some(id));

        let layer = self.content.require_mut(id)?;
        if let (Some(mask), MaskApplyMode::Apply) = (layer.mask.take(), mode) {
            layer.has_alpha = true;
            for (i, px) in layer.buffer.pixels.chunks_exact_mut(PixelBuffer::CHANNELS).enumerate() {
                let x = (i % mask.width() as usize) as u32;
                let y = (i / mask.width() as usize) as u32;
                px[3] = ((px[3] as u32 * mask.value(x, y) as u32 + 127) / 255) as u8;
            }
        }
        self.dirty = true;
        Ok(true)
    }

    /// Turn mask compositing on or off. Returns false when there is no mask.
    pub fn set_mask_apply(&mut self, id: LayerId, apply: bool) -> Result<bool, CommandError> {
        let label = if apply {
            "Enable Layer Mask"
        } else {
            "Disable Layer Mask"
        };
        self.set_mask_flag(id, apply, label, |m| m.apply, |m, v| m.apply = v)
    }

    /// Show the mask instead of the layer. Returns false when there is no
    /// mask.
    pub fn set_mask_show(&mut self, id: LayerId, show: bool) -> Result<bool, CommandError> {
        let label = if show { "Show Layer Mask" } else { "Hide Layer Mask" };
        self.set_mask_flag(id, show, label, |m| m.show, |m, v| m.show = v)
    }

    /// Direct painting at the mask. Not undoable. Returns false when there
    /// is no mask.
    pub fn set_mask_edit(&mut self, id: LayerId, edit: bool) -> Result<bool, CommandError> {
        match self.content.require_mut(id)?.mask.as_mut() {
            Some(mask) => {
                mask.edit = edit;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_mask_flag(
        &mut self,
        id: LayerId,
        value: bool,
        label: &str,
        read: fn(&LayerMask) -> bool,
        write: fn(&mut LayerMask, bool),
    ) -> Result<bool, CommandError> {
        let Some(mask) = self.content.require(id)?.mask.as_ref() else {
            return Ok(false);
        };
        if read(mask) == value {
            return Ok(true);
        }
        self.push_undo(UndoKind::LayerMaskProperties, label, Some(id));
        if let Some(mask) = self.content.require_mut(id)?.mask.as_mut() {
            write(mask, value);
        }
        self.dirty = true;
        Ok(true)
    }

    /// Give a layer an alpha channel. Returns false when it already has one.
    pub fn add_alpha(&mut self, id: LayerId) -> Result<bool, CommandError> {
        let layer = self.content.require(id)?;
        if layer.has_alpha || layer.is_group() {
            return Ok(false);
        }
        self.push_undo(UndoKind::LayerAlpha, "Add Alpha Channel", Some(id));
        self.content.require_mut(id)?.has_alpha = true;
        self.dirty = true;
        Ok(true)
    }

    /// Flatten a layer over `background` and drop its alpha channel.
    /// Returns false when it has none.
    pub fn remove_alpha(&mut self, id: LayerId, background: Rgba) -> Result<bool, CommandError> {
        let layer = self.content.require(id)?;
        if !layer.has_alpha || layer.is_group() {
            return Ok(false);
        }
        self.push_undo(UndoKind::LayerAlpha, "Remove Alpha Channel", Some(id));
        let layer = self.content.require_mut(id)?;
        for px in layer.buffer.pixels.chunks_exact_mut(PixelBuffer::CHANNELS) {
            let a = px[3] as u32;
            for c in 0..3 {
                px[c] = ((px[c] as u32 * a + background[c] as u32 * (255 - a) + 127) / 255) as u8;
            }
            px[3] = 255;
        }
        layer.has_alpha = false;
        self.dirty = true;
        Ok(true)
    }

    /// Combine a layer's alpha, or its mask, into the selection.
    pub fn item_to_selection(&mut self, item: ItemRef, op: ChannelOp) -> Result<(), CommandError> {
        let id = item.layer();
        let layer = self.content.require(id)?;
        let (coverage, offset, label) = match item {
            ItemRef::Layer(_) if layer.is_group() => {
                let (buffer, offset) = self.content.render_group(id).ok_or(CommandError::NoSuchLayer(id))?;
                (luminance::alpha_to_gray(&buffer), offset, "Alpha to Selection")
            }
            ItemRef::Layer(_) => (
                luminance::alpha_to_gray(&layer.buffer),
                layer.offset,
                "Alpha to Selection",
            ),
            ItemRef::Mask(_) => {
                let mask = layer
                    .mask
                    .as_ref()
                    .ok_or_else(|| CommandError::rejected(format!("Layer {id} has no layer mask.")))?;
                (mask.buffer.clone(), layer.offset, "Mask to Selection")
            }
        };

        self.push_undo(UndoKind::SelectionChange, label, Some(id));
        self.content.selection.combine(op, &coverage, offset);
        self.dirty = true;
        Ok(())
    }

    /// The flattened image.
    pub fn projection(&self) -> PixelBuffer {
        self.content.projection()
    }
}
