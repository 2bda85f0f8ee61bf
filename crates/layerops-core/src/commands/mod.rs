//! Layer actions.
//!
//! Every action works on the active layer of the document. Errors never
//! escape an action: they are reported to the session's message log. An
//! action that changes the document ends with exactly one flush. Actions
//! that need more input present a dialog instead (see [`crate::dialogs`]).

mod select;

pub use select::{SelectType, SelectValue, ValueRange};

use crate::dialogs::{self, AddMaskDialog, EditAttributesDialog, NewLayerDialog, OpenDialog, ResizeDialog, ScaleDialog};
use crate::document::{
    AddMaskType, ChannelOp, Document, Layer, LayerId, LayerKind, LayerMode, MaskApplyMode, Placement,
};
use crate::error::CommandError;
use crate::geometry::{self, GeometryHost, ItemRef, Unit};
use crate::session::ActionContext;
use crate::undo::UndoKind;

/// Run an action. `Ok(true)` means the document changed and is flushed.
fn run(
    ctx: &mut ActionContext<'_>,
    doc: &mut Document,
    action: impl FnOnce(&mut ActionContext<'_>, &mut Document) -> Result<bool, CommandError>,
) {
    match action(ctx, doc) {
        Ok(true) => doc.flush(),
        Ok(false) => {}
        Err(err) => {
            tracing::debug!(error = %err, "layer action failed");
            ctx.report(&err);
        }
    }
}

fn active(doc: &Document) -> Result<LayerId, CommandError> {
    doc.active_layer_id().ok_or(CommandError::NoActiveLayer)
}

fn has_mask(doc: &Document, id: LayerId) -> bool {
    doc.layer(id).is_some_and(|l| l.mask.is_some())
}

// === Creating layers ===

/// Turn the floating selection into a layer, or present the new-layer
/// dialog when there is none.
pub fn new_layer(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        if let Some(floating) = doc.floating_selection().map(|l| l.id) {
            doc.floating_to_layer(floating)?;
            return Ok(true);
        }

        let config = &ctx.session.config.dialogs;
        ctx.session.dialogs.present(OpenDialog::NewLayer(NewLayerDialog {
            name: config.layer_new_name.clone(),
            fill: config.layer_new_fill_type,
            width: doc.width(),
            height: doc.height(),
        }));
        Ok(false)
    });
}

/// Add a layer shaped like the active one, named and filled from the
/// dialog defaults.
pub fn new_layer_last_values(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    if doc.floating_selection().is_some() {
        return new_layer(ctx, doc);
    }
    run(ctx, doc, |ctx, doc| {
        let ((width, height), offset, opacity, mode) = match doc.active_layer_id() {
            Some(template) => {
                let item = ItemRef::Layer(template);
                let layer = doc.layer(template).ok_or(CommandError::NoSuchLayer(template))?;
                (doc.item_size(item)?, doc.item_offset(item)?, layer.opacity, layer.mode)
            }
            None => ((doc.width(), doc.height()), (0, 0), 1.0, LayerMode::Normal),
        };

        let session = &ctx.session;
        let config = &session.config.dialogs;
        let id = doc.new_layer_id();
        let mut layer = Layer::new(id, config.layer_new_name.clone(), width, height)
            .with_offset(offset.0, offset.1)
            .with_opacity(opacity)
            .with_mode(mode);
        layer.fill(config.layer_new_fill_type.color(session.foreground, session.background));

        doc.undo_group_start(UndoKind::EditPaste, "New Layer");
        let result = doc.add_layer(layer, Placement::ActiveParent);
        doc.undo_group_end();
        result.map(|_| true)
    });
}

/// Add a layer holding the composite of all visible layers.
pub fn new_layer_from_visible(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        let id = doc.new_layer_id();
        let layer = Layer::from_buffer(id, "Visible", doc.projection());
        doc.add_layer(layer, Placement::ActiveParent)?;
        Ok(true)
    });
}

pub fn new_layer_group(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        let id = doc.new_layer_id();
        doc.add_layer(Layer::group(id, "Layer Group"), Placement::ActiveParent)?;
        Ok(true)
    });
}

// === Stack ===

/// Change the active layer among its siblings.
pub fn select(ctx: &mut ActionContext<'_>, doc: &mut Document, how: SelectType) {
    run(ctx, doc, |_, doc| {
        let current = doc.active_layer_id();
        let parent = current.and_then(|id| doc.layer(id)).and_then(|l| l.parent);
        let siblings = doc.children(parent);
        if siblings.is_empty() {
            return Ok(false);
        }

        let index = current
            .and_then(|id| siblings.iter().position(|&s| s == id))
            .unwrap_or(0);
        let chosen = siblings[how.select_index(index, siblings.len())];
        if Some(chosen) == current {
            return Ok(false);
        }
        doc.set_active_layer(chosen)?;
        Ok(true)
    });
}

pub fn raise(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.raise_layer(active(doc)?)?;
        Ok(true)
    });
}

pub fn raise_to_top(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.raise_layer_to_top(active(doc)?)?;
        Ok(true)
    });
}

pub fn lower(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.lower_layer(active(doc)?)?;
        Ok(true)
    });
}

pub fn lower_to_bottom(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.lower_layer_to_bottom(active(doc)?)?;
        Ok(true)
    });
}

/// Duplicate the active layer next to it, inside the same parent.
pub fn duplicate(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.duplicate_layer(active(doc)?)?;
        Ok(true)
    });
}

/// Anchor the active layer if it is a floating selection.
pub fn anchor(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        let id = active(doc)?;
        if !doc.layer(id).is_some_and(Layer::is_floating) {
            return Ok(false);
        }
        doc.anchor_floating(id)?;
        Ok(true)
    });
}

pub fn merge_down(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.merge_down(active(doc)?)?;
        Ok(true)
    });
}

pub fn merge_group(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.merge_group(active(doc)?)?;
        Ok(true)
    });
}

/// Remove the active layer and close the dialogs that belonged to it.
pub fn delete(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        doc.remove_layer(active(doc)?)?;
        ctx.session.dialogs.close_orphans(doc);
        Ok(true)
    });
}

/// Turn a text layer into a plain one.
pub fn text_discard(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| doc.discard_text(active(doc)?));
}

pub fn edit_attributes(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        let id = active(doc)?;
        let layer = doc.layer(id).ok_or(CommandError::NoSuchLayer(id))?;
        let auto_rename = match &layer.kind {
            LayerKind::Text(info) => Some(info.auto_rename),
            _ => None,
        };
        ctx.session
            .dialogs
            .present(OpenDialog::EditAttributes(EditAttributesDialog {
                layer: id,
                name: layer.name.clone(),
                auto_rename,
            }));
        Ok(false)
    });
}

// === Geometry ===

/// Unit a geometry dialog opens with: the view's unit, unless the last one
/// used was a percentage.
fn dialog_unit(ctx: &ActionContext<'_>, last: Unit) -> Unit {
    match ctx.display_unit() {
        Some(unit) if last != Unit::Percent => unit,
        _ => last,
    }
}

/// Present the resize dialog for the active layer.
pub fn resize(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        let item = ItemRef::Layer(active(doc)?);
        let (width, height) = doc.item_size(item)?;
        let unit = dialog_unit(ctx, ctx.session.config.last_used.resize_unit);
        ctx.session.config.last_used.resize_unit = unit;
        ctx.session.dialogs.present(OpenDialog::Resize(ResizeDialog {
            item,
            width,
            height,
            unit,
        }));
        Ok(false)
    });
}

pub fn resize_to_image(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        doc.resize_layer_to_image(active(doc)?)?;
        Ok(true)
    });
}

/// Present the scale dialog for the active layer.
pub fn scale(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        let item = ItemRef::Layer(active(doc)?);
        let (width, height) = doc.item_size(item)?;
        let unit = dialog_unit(ctx, ctx.session.config.last_used.scale_unit);
        let interpolation = ctx.session.config.scale_interpolation();

        let last_used = &mut ctx.session.config.last_used;
        last_used.scale_unit = unit;
        last_used.scale_interpolation = Some(interpolation);
        ctx.session.dialogs.present(OpenDialog::Scale(ScaleDialog {
            item,
            width,
            height,
            unit,
            interpolation,
        }));
        Ok(false)
    });
}

/// Crop the active layer to the selection bounds.
pub fn crop_to_selection(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        let id = active(doc)?;
        let rect = doc.selection().bounds().ok_or(CommandError::EmptySelection)?;
        // The orchestrator flushes on its own
        let _ = geometry::crop_to_rect(doc, ItemRef::Layer(id), rect, "Crop Layer to Selection")?;
        Ok(false)
    });
}

/// Crop the active layer to the bounds of its content.
pub fn crop_to_content(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| {
        let _ = geometry::crop_to_content(doc, ItemRef::Layer(active(doc)?))?;
        Ok(false)
    });
}

// === Masks ===

fn present_add_mask(ctx: &mut ActionContext<'_>, layer: LayerId) {
    let config = &ctx.session.config.dialogs;
    let dialog = AddMaskDialog {
        layer,
        kind: config.layer_add_mask_type,
        invert: config.layer_add_mask_invert,
    };
    ctx.session.dialogs.present(OpenDialog::AddMask(dialog));
}

/// Present the add-mask dialog unless the active layer has a mask.
pub fn mask_add(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        let id = active(doc)?;
        if !has_mask(doc, id) {
            present_add_mask(ctx, id);
        }
        Ok(false)
    });
}

/// Add a mask using the dialog's last values.
///
/// A channel mask takes the active channel, else the first one. Without
/// any channel the dialog is presented instead.
pub fn mask_add_last_values(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| {
        let id = active(doc)?;
        if has_mask(doc, id) {
            return Ok(false);
        }

        let kind = ctx.session.config.dialogs.layer_add_mask_type;
        let invert = ctx.session.config.dialogs.layer_add_mask_invert;
        let channel = if kind == AddMaskType::Channel {
            let chosen = doc
                .active_channel()
                .or_else(|| (!doc.channels().is_empty()).then_some(0));
            if chosen.is_none() {
                present_add_mask(ctx, id);
                return Ok(false);
            }
            chosen
        } else {
            None
        };

        dialogs::add_mask(doc, id, kind, invert, channel)?;
        Ok(true)
    });
}

pub fn mask_apply(ctx: &mut ActionContext<'_>, doc: &mut Document, mode: MaskApplyMode) {
    run(ctx, doc, |_, doc| doc.apply_mask(active(doc)?, mode));
}

pub fn mask_edit(ctx: &mut ActionContext<'_>, doc: &mut Document, edit: bool) {
    run(ctx, doc, |_, doc| doc.set_mask_edit(active(doc)?, edit));
}

pub fn mask_show(ctx: &mut ActionContext<'_>, doc: &mut Document, show: bool) {
    run(ctx, doc, |_, doc| doc.set_mask_show(active(doc)?, show));
}

pub fn mask_disable(ctx: &mut ActionContext<'_>, doc: &mut Document, disable: bool) {
    run(ctx, doc, |_, doc| doc.set_mask_apply(active(doc)?, !disable));
}

pub fn mask_to_selection(ctx: &mut ActionContext<'_>, doc: &mut Document, op: ChannelOp) {
    run(ctx, doc, |_, doc| {
        let id = active(doc)?;
        if !has_mask(doc, id) {
            return Ok(false);
        }
        doc.item_to_selection(ItemRef::Mask(id), op)?;
        Ok(true)
    });
}

// === Alpha ===

pub fn alpha_add(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |_, doc| doc.add_alpha(active(doc)?));
}

/// Flatten the active layer over the background color.
pub fn alpha_remove(ctx: &mut ActionContext<'_>, doc: &mut Document) {
    run(ctx, doc, |ctx, doc| doc.remove_alpha(active(doc)?, ctx.session.background));
}

pub fn alpha_to_selection(ctx: &mut ActionContext<'_>, doc: &mut Document, op: ChannelOp) {
    run(ctx, doc, |_, doc| {
        doc.item_to_selection(ItemRef::Layer(active(doc)?), op)?;
        Ok(true)
    });
}

// === Properties ===
//
// Repeated changes to the same layer fold into one undo step while the
// newest step is of the same kind for that layer.

pub fn opacity(ctx: &mut ActionContext<'_>, doc: &mut Document, how: SelectValue) {
    run(ctx, doc, |_, doc| {
        let id = active(doc)?;
        let current = doc.layer(id).ok_or(CommandError::NoSuchLayer(id))?.opacity;
        let push_undo = !doc.can_compress_undo(UndoKind::LayerOpacity, id);
        doc.set_opacity(id, ValueRange::OPACITY.select(how, current), push_undo)?;
        Ok(true)
    });
}

/// Step through [`LayerMode::ALL`].
pub fn mode(ctx: &mut ActionContext<'_>, doc: &mut Document, how: SelectValue) {
    run(ctx, doc, |_, doc| {
        let id = active(doc)?;
        let current = doc.layer(id).ok_or(CommandError::NoSuchLayer(id))?.mode;
        let index = ValueRange::MODE_INDEX.select(how, current.index() as f64);
        let push_undo = !doc.can_compress_undo(UndoKind::LayerMode, id);
        doc.set_mode(id, LayerMode::from_index(index.round() as usize), push_undo)?;
        Ok(true)
    });
}

pub fn lock_alpha(ctx: &mut ActionContext<'_>, doc: &mut Document, lock: bool) {
    run(ctx, doc, |_, doc| {
        let id = active(doc)?;
        if doc.layer(id).ok_or(CommandError::NoSuchLayer(id))?.lock_alpha == lock {
            return Ok(false);
        }
        let push_undo = !doc.can_compress_undo(UndoKind::LayerLockAlpha, id);
        doc.set_lock_alpha(id, lock, push_undo)?;
        Ok(true)
    });
}

#[cfg(test)]
mod tests;
