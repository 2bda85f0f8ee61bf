//! Dialogs opened by layer commands.
//!
//! A dialog is a command object: it carries the values it was opened with
//! and applies the user's response to the document. The registry keeps at
//! most one open dialog per owner and kind, so invoking a command twice
//! presents the same dialog again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::buffer::Interpolation;
use crate::document::{AddMaskType, Document, FillType, Layer, LayerId, Placement};
use crate::error::CommandError;
use crate::geometry::{self, resolve, GeometryHost, GeometryInput, ItemRef, Unit};
use crate::session::ActionContext;
use crate::undo::UndoKind;

/// The layer a dialog belongs to, or `None` for the image.
pub type DialogOwner = Option<LayerId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogKind {
    NewLayer,
    EditAttributes,
    AddMask,
    Scale,
    Resize,
}

/// What the dialog does after a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogOutcome {
    Close,
    /// The response was rejected; the user may correct it.
    KeepOpen,
}

/// A dialog that turns a response into document changes.
pub trait DialogCommand {
    type Params;

    fn apply(&self, ctx: &mut ActionContext<'_>, doc: &mut Document, params: Self::Params) -> DialogOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLayerDialog {
    pub name: String,
    pub fill: FillType,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLayerParams {
    pub name: String,
    pub fill: FillType,
    pub width: u32,
    pub height: u32,
}

impl DialogCommand for NewLayerDialog {
    type Params = NewLayerParams;

    fn apply(&self, ctx: &mut ActionContext<'_>, doc: &mut Document, params: NewLayerParams) -> DialogOutcome {
        let dialogs = &mut ctx.session.config.dialogs;
        dialogs.layer_new_name = params.name.clone();
        dialogs.layer_new_fill_type = params.fill;

        if params.width == 0 || params.height == 0 {
            ctx.report(&CommandError::InvalidDimensions {
                width: params.width as i64,
                height: params.height as i64,
            });
            return DialogOutcome::KeepOpen;
        }

        let id = doc.new_layer_id();
        let mut layer = Layer::new(id, params.name, params.width, params.height);
        layer.fill(params.fill.color(ctx.session.foreground, ctx.session.background));
        match doc.add_layer(layer, Placement::ActiveParent) {
            Ok(_) => doc.flush(),
            Err(err) => ctx.report(&err),
        }
        DialogOutcome::Close
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAttributesDialog {
    pub layer: LayerId,
    pub name: String,
    /// Present for text layers only.
    pub auto_rename: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAttributesParams {
    pub name: String,
    /// Ignored unless the layer is a text layer.
    pub auto_rename: bool,
}

impl DialogCommand for EditAttributesDialog {
    type Params = EditAttributesParams;

    fn apply(
        &self,
        ctx: &mut ActionContext<'_>,
        doc: &mut Document,
        params: EditAttributesParams,
    ) -> DialogOutcome {
        let Some(layer) = doc.layer(self.layer) else {
            ctx.report(&CommandError::NoSuchLayer(self.layer));
            return DialogOutcome::Close;
        };
        let is_text = layer.kind.is_text();

        if params.name != layer.name {
            if let Err(err) = doc.rename_layer(self.layer, &params.name) {
                ctx.report(&err);
                return DialogOutcome::KeepOpen;
            }
            doc.flush();
        }
        if is_text {
            if let Err(err) = doc.set_text_auto_rename(self.layer, params.auto_rename) {
                ctx.report(&err);
            }
        }
        DialogOutcome::Close
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMaskDialog {
    pub layer: LayerId,
    pub kind: AddMaskType,
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMaskParams {
    pub kind: AddMaskType,
    pub invert: bool,
    /// Channel index for [`AddMaskType::Channel`].
    pub channel: Option<usize>,
}

impl DialogCommand for AddMaskDialog {
    type Params = AddMaskParams;

    fn apply(&self, ctx: &mut ActionContext<'_>, doc: &mut Document, params: AddMaskParams) -> DialogOutcome {
        let dialogs = &mut ctx.session.config.dialogs;
        dialogs.layer_add_mask_type = params.kind;
        dialogs.layer_add_mask_invert = params.invert;

        match add_mask(doc, self.layer, params.kind, params.invert, params.channel) {
            Ok(()) => {
                doc.flush();
                DialogOutcome::Close
            }
            Err(err) => {
                ctx.report(&err);
                DialogOutcome::KeepOpen
            }
        }
    }
}

/// Create, optionally invert and attach a mask as one undo step.
pub(crate) fn add_mask(
    doc: &mut Document,
    layer: LayerId,
    kind: AddMaskType,
    invert: bool,
    channel: Option<usize>,
) -> Result<(), CommandError> {
    doc.undo_group_start(UndoKind::LayerAddMask, "Add Layer Mask");
    let result = doc.create_mask(layer, kind, channel).and_then(|mut mask| {
        if invert {
            mask.invert();
        }
        doc.add_mask(layer, mask)
    });
    doc.undo_group_end();
    result
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleDialog {
    pub item: ItemRef,
    pub width: u32,
    pub height: u32,
    pub unit: Unit,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub input: GeometryInput,
    pub interpolation: Interpolation,
}

impl DialogCommand for ScaleDialog {
    type Params = ScaleParams;

    fn apply(&self, ctx: &mut ActionContext<'_>, doc: &mut Document, params: ScaleParams) -> DialogOutcome {
        let last_used = &mut ctx.session.config.last_used;
        last_used.scale_unit = params.input.unit;
        last_used.scale_interpolation = Some(params.interpolation);

        let request = match doc
            .item_size(self.item)
            .and_then(|current| resolve(&params.input, current, doc.resolution()))
        {
            Ok(request) => request,
            Err(err) => {
                ctx.report(&err);
                return DialogOutcome::KeepOpen;
            }
        };

        let (display, factory) = ctx.progress_parts();
        let result = geometry::scale(doc, self.item, &request, params.interpolation, display, factory);
        if let Err(err) = result {
            ctx.report(&err);
        }
        DialogOutcome::Close
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeDialog {
    pub item: ItemRef,
    pub width: u32,
    pub height: u32,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeParams {
    pub input: GeometryInput,
}

impl DialogCommand for ResizeDialog {
    type Params = ResizeParams;

    fn apply(&self, ctx: &mut ActionContext<'_>, doc: &mut Document, params: ResizeParams) -> DialogOutcome {
        ctx.session.config.last_used.resize_unit = params.input.unit;

        let result = doc
            .item_size(self.item)
            .and_then(|current| resolve(&params.input, current, doc.resolution()));
        let request = match result {
            Ok(request) => request,
            Err(err) => {
                ctx.report(&err);
                return DialogOutcome::KeepOpen;
            }
        };

        if let Err(err) = geometry::resize(doc, self.item, &request, "Resize Layer") {
            ctx.report(&err);
        }
        DialogOutcome::Close
    }
}

/// A dialog waiting for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OpenDialog {
    NewLayer(NewLayerDialog),
    EditAttributes(EditAttributesDialog),
    AddMask(AddMaskDialog),
    Scale(ScaleDialog),
    Resize(ResizeDialog),
}

impl OpenDialog {
    pub fn kind(&self) -> DialogKind {
        match self {
            OpenDialog::NewLayer(_) => DialogKind::NewLayer,
            OpenDialog::EditAttributes(_) => DialogKind::EditAttributes,
            OpenDialog::AddMask(_) => DialogKind::AddMask,
            OpenDialog::Scale(_) => DialogKind::Scale,
            OpenDialog::Resize(_) => DialogKind::Resize,
        }
    }

    pub fn owner(&self) -> DialogOwner {
        match self {
            OpenDialog::NewLayer(_) => None,
            OpenDialog::EditAttributes(d) => Some(d.layer),
            OpenDialog::AddMask(d) => Some(d.layer),
            OpenDialog::Scale(d) => Some(d.item.layer()),
            OpenDialog::Resize(d) => Some(d.item.layer()),
        }
    }
}

/// The user's answer to an open dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DialogResponse {
    NewLayer(NewLayerParams),
    EditAttributes(EditAttributesParams),
    AddMask(AddMaskParams),
    Scale(ScaleParams),
    Resize(ResizeParams),
}

impl DialogResponse {
    pub fn kind(&self) -> DialogKind {
        match self {
            DialogResponse::NewLayer(_) => DialogKind::NewLayer,
            DialogResponse::EditAttributes(_) => DialogKind::EditAttributes,
            DialogResponse::AddMask(_) => DialogKind::AddMask,
            DialogResponse::Scale(_) => DialogKind::Scale,
            DialogResponse::Resize(_) => DialogKind::Resize,
        }
    }
}

/// Open dialogs, at most one per owner and kind.
#[derive(Debug, Default)]
pub struct DialogRegistry {
    open: HashMap<(DialogOwner, DialogKind), OpenDialog>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dialog`, or return the one already open for the same owner
    /// and kind.
    pub fn present(&mut self, dialog: OpenDialog) -> &OpenDialog {
        let key = (dialog.owner(), dialog.kind());
        self.open.entry(key).or_insert(dialog)
    }

    pub fn get(&self, owner: DialogOwner, kind: DialogKind) -> Option<&OpenDialog> {
        self.open.get(&(owner, kind))
    }

    pub fn is_open(&self, owner: DialogOwner, kind: DialogKind) -> bool {
        self.open.contains_key(&(owner, kind))
    }

    pub fn close(&mut self, owner: DialogOwner, kind: DialogKind) -> Option<OpenDialog> {
        self.open.remove(&(owner, kind))
    }

    /// Close dialogs whose layer is no longer in `doc`.
    pub fn close_orphans(&mut self, doc: &Document) {
        self.open
            .retain(|(owner, _), _| owner.is_none_or(|id| doc.layer(id).is_some()));
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// Apply a response to the matching open dialog.
///
/// Returns `None` when no such dialog is open. A dialog that answers
/// [`DialogOutcome::Close`] is removed from the registry.
pub fn respond(
    ctx: &mut ActionContext<'_>,
    doc: &mut Document,
    owner: DialogOwner,
    response: DialogResponse,
) -> Option<DialogOutcome> {
    let kind = response.kind();
    let dialog = ctx.session.dialogs.get(owner, kind)?.clone();
    let outcome = match (dialog, response) {
        (OpenDialog::NewLayer(d), DialogResponse::NewLayer(p)) => d.apply(ctx, doc, p),
        (OpenDialog::EditAttributes(d), DialogResponse::EditAttributes(p)) => d.apply(ctx, doc, p),
        (OpenDialog::AddMask(d), DialogResponse::AddMask(p)) => d.apply(ctx, doc, p),
        (OpenDialog::Scale(d), DialogResponse::Scale(p)) => d.apply(ctx, doc, p),
        (OpenDialog::Resize(d), DialogResponse::Resize(p)) => d.apply(ctx, doc, p),
        _ => return None,
    };
    tracing::debug!(?owner, ?kind, ?outcome, "dialog response");
    if outcome == DialogOutcome::Close {
        ctx.session.dialogs.close(owner, kind);
    }
    Some(outcome)
}
