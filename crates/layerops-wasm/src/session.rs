//! WASM bindings for a layered document and its editing session.
//!
//! A [`JsLayerSession`] owns one document plus the session state commands
//! need. Commands never throw for user-level failures: they queue messages
//! that JavaScript drains with `take_messages()`.

use layerops_core::commands::{self, SelectType, SelectValue};
use layerops_core::config::SessionConfig;
use layerops_core::dialogs::{respond, DialogOutcome, DialogResponse, ResizeParams, ScaleParams};
use layerops_core::document::{Document, Layer, LayerId, LayerMode, Placement};
use layerops_core::geometry::GeometryInput;
use layerops_core::session::{ActionContext, Session};
use layerops_core::PixelBuffer;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::progress::ConsoleProgressFactory;
use crate::types::{interpolation_from_u8, unit_from_u8, JsLayerPixels};

/// Summary of one layer, serialized for JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct LayerInfo {
    id: u32,
    parent: Option<u32>,
    name: String,
    width: u32,
    height: u32,
    offset_x: i32,
    offset_y: i32,
    opacity: f64,
    mode: LayerMode,
    visible: bool,
    is_group: bool,
    has_mask: bool,
    has_alpha: bool,
}

impl From<&Layer> for LayerInfo {
    fn from(layer: &Layer) -> Self {
        Self {
            id: layer.id.0,
            parent: layer.parent.map(|p| p.0),
            name: layer.name.clone(),
            width: layer.width(),
            height: layer.height(),
            offset_x: layer.offset.0,
            offset_y: layer.offset.1,
            opacity: layer.opacity,
            mode: layer.mode,
            visible: layer.visible,
            is_group: layer.is_group(),
            has_mask: layer.mask.is_some(),
            has_alpha: layer.has_alpha,
        }
    }
}

/// A document with its editing session.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const session = new JsLayerSession(800, 600);
/// const id = session.add_layer("Photo", 400, 300, rgba, 0, 0);
/// session.scale_layer(200, 150, 0, 2);
/// for (const m of session.take_messages()) console.warn(m.text);
/// ```
#[wasm_bindgen]
pub struct JsLayerSession {
    session: Session,
    doc: Document,
}

#[wasm_bindgen]
impl JsLayerSession {
    /// Create an empty document of the given size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Result<JsLayerSession, JsValue> {
        let session = Session::with_progress_factory(SessionConfig::default(), Box::new(ConsoleProgressFactory));
        let doc = session
            .new_document(width, height)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsLayerSession { session, doc })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.doc.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.doc.height()
    }

    /// Incremented every time a command finishes changing the document.
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> u64 {
        self.doc.generation()
    }

    /// Add a layer from RGBA pixels above the active layer. Returns its id.
    pub fn add_layer(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        offset_x: i32,
        offset_y: i32,
    ) -> Result<u32, JsValue> {
        let buffer =
            PixelBuffer::try_new(width, height, pixels).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let id = self.doc.new_layer_id();
        let layer = Layer::from_buffer(id, name, buffer).with_offset(offset_x, offset_y);
        let id = self
            .doc
            .add_layer(layer, Placement::default())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.doc.flush();
        Ok(id.0)
    }

    /// Ids of all layers, parents before their children, top first.
    pub fn layer_ids(&self) -> Vec<u32> {
        self.doc.layers().iter().map(|l| l.id.0).collect()
    }

    pub fn active_layer(&self) -> Option<u32> {
        self.doc.active_layer_id().map(|id| id.0)
    }

    pub fn set_active_layer(&mut self, id: u32) -> Result<(), JsValue> {
        self.doc
            .set_active_layer(LayerId(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Layer properties as a plain object, or `undefined` for unknown ids.
    pub fn layer_info(&self, id: u32) -> Result<JsValue, JsValue> {
        match self.doc.layer(LayerId(id)) {
            Some(layer) => serde_wasm_bindgen::to_value(&LayerInfo::from(layer))
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Pixels of a layer. Groups have none of their own.
    pub fn layer_pixels(&self, id: u32) -> Option<JsLayerPixels> {
        self.doc
            .layer(LayerId(id))
            .filter(|l| !l.is_group())
            .map(|l| JsLayerPixels::from_buffer(&l.buffer))
    }

    /// The flattened image.
    pub fn projection(&self) -> JsLayerPixels {
        JsLayerPixels::from_buffer(&self.doc.projection())
    }

    /// Drain queued messages as `{ severity, text }` objects.
    pub fn take_messages(&mut self) -> Result<JsValue, JsValue> {
        let messages = self.session.messages.drain();
        serde_wasm_bindgen::to_value(&messages).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn message_count(&self) -> usize {
        self.session.messages.len()
    }

    pub fn undo(&mut self) -> Option<String> {
        let label = self.doc.undo()?;
        self.doc.flush();
        Some(label)
    }

    pub fn redo(&mut self) -> Option<String> {
        let label = self.doc.redo()?;
        self.doc.flush();
        Some(label)
    }

    // === Layer commands on the active layer ===

    pub fn new_layer_from_visible(&mut self) {
        commands::new_layer_from_visible(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn new_layer_group(&mut self) {
        commands::new_layer_group(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    /// Select a sibling: 0 = first, 1 = last, 2 = previous, 3 = next.
    pub fn select(&mut self, how: u8) {
        let how = match how {
            0 => SelectType::First,
            1 => SelectType::Last,
            2 => SelectType::Previous,
            _ => SelectType::Next,
        };
        commands::select(&mut ActionContext::new(&mut self.session), &mut self.doc, how);
    }

    pub fn raise(&mut self) {
        commands::raise(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn lower(&mut self) {
        commands::lower(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn duplicate(&mut self) {
        commands::duplicate(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn merge_down(&mut self) {
        commands::merge_down(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn delete(&mut self) {
        commands::delete(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    /// Resize the active layer's canvas. The offsets place the old content
    /// inside the new canvas.
    pub fn resize_layer(&mut self, width: f64, height: f64, offset_x: f64, offset_y: f64, unit: u8) -> bool {
        let input = GeometryInput::pixels(width, height)
            .with_offset(offset_x, offset_y)
            .with_unit(unit_from_u8(unit));
        self.geometry_dialog(commands::resize, DialogResponse::Resize(ResizeParams { input }))
    }

    /// Scale the active layer. Returns false when the size was rejected.
    pub fn scale_layer(&mut self, width: f64, height: f64, unit: u8, interpolation: u8) -> bool {
        let input = GeometryInput::pixels(width, height).with_unit(unit_from_u8(unit));
        let response = DialogResponse::Scale(ScaleParams {
            input,
            interpolation: interpolation_from_u8(interpolation),
        });
        self.geometry_dialog(commands::scale, response)
    }

    pub fn resize_to_image(&mut self) {
        commands::resize_to_image(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn crop_to_content(&mut self) {
        commands::crop_to_content(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn crop_to_selection(&mut self) {
        commands::crop_to_selection(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    /// Set the active layer's opacity, in `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f64) {
        commands::opacity(
            &mut ActionContext::new(&mut self.session),
            &mut self.doc,
            SelectValue::Set(opacity),
        );
    }

    /// Set the active layer's mode by its position in the mode menu.
    pub fn set_mode(&mut self, index: u32) {
        commands::mode(
            &mut ActionContext::new(&mut self.session),
            &mut self.doc,
            SelectValue::Set(index as f64),
        );
    }

    pub fn alpha_add(&mut self) {
        commands::alpha_add(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }

    pub fn alpha_remove(&mut self) {
        commands::alpha_remove(&mut ActionContext::new(&mut self.session), &mut self.doc);
    }
}

impl JsLayerSession {
    /// Open a geometry dialog for the active layer and answer it at once.
    fn geometry_dialog(
        &mut self,
        present: fn(&mut ActionContext<'_>, &mut Document),
        response: DialogResponse,
    ) -> bool {
        let Some(owner) = self.doc.active_layer_id() else {
            // Let the command report the missing layer
            present(&mut ActionContext::new(&mut self.session), &mut self.doc);
            return false;
        };
        let kind = response.kind();
        let mut ctx = ActionContext::new(&mut self.session);
        present(&mut ctx, &mut self.doc);
        let outcome = respond(&mut ctx, &mut self.doc, Some(owner), response);
        // Nobody is left to answer a dialog kept open for a retry
        if outcome == Some(DialogOutcome::KeepOpen) {
            ctx.session.dialogs.close(Some(owner), kind);
        }
        outcome == Some(DialogOutcome::Close)
    }
}


/// WASM-specific tests that require JsValue.
///
/// Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use layerops_core::message::Message;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_take_messages() {
        let mut session = JsLayerSession::new(8, 8).unwrap();
        session.raise();

        let messages: Vec<Message> = serde_wasm_bindgen::from_value(session.take_messages().unwrap()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "There is no active layer.");
        assert_eq!(session.message_count(), 0);
    }

    #[wasm_bindgen_test]
    fn test_layer_info() {
        let mut session = JsLayerSession::new(8, 8).unwrap();
        let id = session.add_layer("Ink", 2, 2, vec![0; 16], 1, 1).unwrap();

        assert!(session.layer_info(id).unwrap().is_object());
        assert!(session.layer_info(id + 100).unwrap().is_undefined());
    }

    #[wasm_bindgen_test]
    fn test_invalid_pixels_throw() {
        let mut session = JsLayerSession::new(8, 8).unwrap();
        assert!(session.add_layer("Bad", 2, 2, vec![0; 3], 0, 0).is_err());
    }
}
