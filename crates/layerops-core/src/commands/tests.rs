use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::buffer::{Interpolation, PixelBuffer, TRANSPARENT};
use crate::config::SessionConfig;
use crate::dialogs::{respond, DialogKind, DialogOutcome, DialogResponse, ResizeParams, ScaleParams};
use crate::document::{Channel, FillType, FloatingTarget, Selection};
use crate::geometry::GeometryInput;
use crate::message::{Message, Severity};
use crate::progress::testing::{ProgressLog, RecordingFactory};
use crate::session::testing::TestDisplay;
use crate::session::Session;
use image::GrayImage;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn doc() -> Document {
    Document::new(40, 30).unwrap()
}

fn add(doc: &mut Document, name: &str, buffer: PixelBuffer) -> LayerId {
    let id = doc.new_layer_id();
    doc.add_layer(Layer::from_buffer(id, name, buffer), Placement::default())
        .unwrap()
}

fn messages(session: &mut Session) -> Vec<Message> {
    session.messages.drain()
}

#[test]
fn test_no_active_layer_is_reported() {
    let mut session = Session::default();
    let mut doc = doc();
    let generation = doc.generation();

    raise(&mut ActionContext::new(&mut session), &mut doc);

    assert_eq!(doc.generation(), generation);
    let messages = messages(&mut session);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "There is no active layer.");
}

#[test]
fn test_new_layer_presents_dialog() {
    let mut session = Session::default();
    session.config.dialogs.layer_new_name = "Ink".to_string();
    let mut doc = doc();

    new_layer(&mut ActionContext::new(&mut session), &mut doc);

    match session.dialogs.get(None, DialogKind::NewLayer) {
        Some(OpenDialog::NewLayer(dialog)) => {
            assert_eq!(dialog.name, "Ink");
            assert_eq!((dialog.width, dialog.height), (40, 30));
        }
        other => panic!("expected new layer dialog, got {other:?}"),
    }
    assert_eq!(doc.layer_count(), 0);
}

#[test]
fn test_new_layer_converts_floating_selection() {
    let mut session = Session::default();
    let mut doc = doc();
    let base = add(&mut doc, "Base", PixelBuffer::filled(40, 30, RED));
    let floating = doc
        .float_buffer(PixelBuffer::filled(4, 4, BLUE), (1, 1), FloatingTarget::Layer(base))
        .unwrap();
    let generation = doc.generation();

    new_layer(&mut ActionContext::new(&mut session), &mut doc);

    let layer = doc.layer(floating).unwrap();
    assert!(!layer.is_floating());
    assert_eq!(layer.name, "Pasted Layer");
    assert_eq!(doc.generation(), generation + 1);
    assert!(session.dialogs.is_empty());
}

#[test]
fn test_new_layer_last_values_copies_active_layer() {
    let mut session = Session::default();
    session.config.dialogs.layer_new_fill_type = FillType::Background;
    session.background = BLUE;
    let mut doc = doc();
    let id = doc.new_layer_id();
    doc.add_layer(
        Layer::new(id, "Template", 12, 8)
            .with_offset(3, 4)
            .with_opacity(0.5)
            .with_mode(LayerMode::Screen),
        Placement::default(),
    )
    .unwrap();

    new_layer_last_values(&mut ActionContext::new(&mut session), &mut doc);

    let layer = doc.active_layer().unwrap();
    assert_ne!(layer.id, id);
    assert_eq!(layer.name, "Layer");
    assert_eq!((layer.width(), layer.height()), (12, 8));
    assert_eq!(layer.offset, (3, 4));
    assert_eq!(layer.opacity, 0.5);
    assert_eq!(layer.mode, LayerMode::Screen);
    assert_eq!(layer.buffer.pixel(0, 0), BLUE);
    assert_eq!(doc.undo_labels()[0], "New Layer");
}

#[test]
fn test_new_layer_last_values_without_active_uses_image() {
    let mut session = Session::default();
    let mut doc = doc();

    new_layer_last_values(&mut ActionContext::new(&mut session), &mut doc);

    let layer = doc.active_layer().unwrap();
    assert_eq!((layer.width(), layer.height()), (40, 30));
    assert_eq!(layer.offset, (0, 0));
    assert_eq!(layer.buffer.pixel(0, 0), TRANSPARENT);
}

#[test]
fn test_new_from_visible_and_group() {
    let mut session = Session::default();
    let mut doc = doc();
    add(&mut doc, "Red", PixelBuffer::filled(40, 30, RED));

    new_layer_from_visible(&mut ActionContext::new(&mut session), &mut doc);
    let visible = doc.active_layer().unwrap();
    assert_eq!(visible.name, "Visible");
    assert_eq!(visible.buffer.pixel(5, 5), RED);

    new_layer_group(&mut ActionContext::new(&mut session), &mut doc);
    let group = doc.active_layer().unwrap();
    assert!(group.is_group());
    assert_eq!(group.name, "Layer Group");
    assert!(session.messages.is_empty());
}

#[test]
fn test_select_among_siblings() {
    let mut session = Session::default();
    let mut doc = doc();
    let bottom = add(&mut doc, "Bottom", PixelBuffer::transparent(2, 2));
    let middle = add(&mut doc, "Middle", PixelBuffer::transparent(2, 2));
    let top = add(&mut doc, "Top", PixelBuffer::transparent(2, 2));
    assert_eq!(doc.active_layer_id(), Some(top));

    select(&mut ActionContext::new(&mut session), &mut doc, SelectType::Next);
    assert_eq!(doc.active_layer_id(), Some(middle));

    select(&mut ActionContext::new(&mut session), &mut doc, SelectType::Last);
    assert_eq!(doc.active_layer_id(), Some(bottom));

    let generation = doc.generation();
    select(&mut ActionContext::new(&mut session), &mut doc, SelectType::Next);
    assert_eq!(doc.active_layer_id(), Some(bottom));
    assert_eq!(doc.generation(), generation);

    select(&mut ActionContext::new(&mut session), &mut doc, SelectType::First);
    assert_eq!(doc.active_layer_id(), Some(top));
}

#[test]
fn test_raise_at_top_reports() {
    let mut session = Session::default();
    let mut doc = doc();
    add(&mut doc, "Bottom", PixelBuffer::transparent(2, 2));
    add(&mut doc, "Top", PixelBuffer::transparent(2, 2));

    raise(&mut ActionContext::new(&mut session), &mut doc);

    let messages = messages(&mut session);
    assert_eq!(messages[0].text, "Layer cannot be raised higher.");
    assert_eq!(messages[0].severity, Severity::Warning);
}

#[test]
fn test_lower_then_raise_to_top() {
    let mut session = Session::default();
    let mut doc = doc();
    let bottom = add(&mut doc, "Bottom", PixelBuffer::transparent(2, 2));
    let top = add(&mut doc, "Top", PixelBuffer::transparent(2, 2));

    lower(&mut ActionContext::new(&mut session), &mut doc);
    assert_eq!(doc.children(None), vec![bottom, top]);

    raise_to_top(&mut ActionContext::new(&mut session), &mut doc);
    assert_eq!(doc.children(None), vec![top, bottom]);

    lower_to_bottom(&mut ActionContext::new(&mut session), &mut doc);
    assert_eq!(doc.children(None), vec![bottom, top]);
    assert!(session.messages.is_empty());
}

#[test]
fn test_duplicate_and_delete() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Sky", PixelBuffer::filled(2, 2, BLUE));

    duplicate(&mut ActionContext::new(&mut session), &mut doc);
    let copy = doc.active_layer_id().unwrap();
    assert_ne!(copy, id);
    assert_eq!(doc.layer(copy).unwrap().name, "Sky copy");

    edit_attributes(&mut ActionContext::new(&mut session), &mut doc);
    assert!(session.dialogs.is_open(Some(copy), DialogKind::EditAttributes));

    delete(&mut ActionContext::new(&mut session), &mut doc);
    assert!(doc.layer(copy).is_none());
    assert!(session.dialogs.is_empty());
}

#[test]
fn test_anchor_only_floating() {
    let mut session = Session::default();
    let mut doc = doc();
    let base = add(&mut doc, "Base", PixelBuffer::transparent(40, 30));
    let generation = doc.generation();

    anchor(&mut ActionContext::new(&mut session), &mut doc);
    assert_eq!(doc.generation(), generation);

    doc.float_buffer(PixelBuffer::filled(2, 2, RED), (3, 3), FloatingTarget::Layer(base))
        .unwrap();
    anchor(&mut ActionContext::new(&mut session), &mut doc);

    assert!(doc.floating_selection().is_none());
    assert_eq!(doc.layer(base).unwrap().buffer.pixel(3, 3), RED);
    assert_eq!(doc.active_layer_id(), Some(base));
}

#[test]
fn test_merge_down() {
    let mut session = Session::default();
    let mut doc = doc();
    add(&mut doc, "Bottom", PixelBuffer::filled(4, 4, RED));
    add(&mut doc, "Top", PixelBuffer::filled(2, 2, BLUE));

    merge_down(&mut ActionContext::new(&mut session), &mut doc);

    assert_eq!(doc.layer_count(), 1);
    let merged = doc.active_layer().unwrap();
    assert_eq!(merged.name, "Bottom");
    assert_eq!(merged.buffer.pixel(0, 0), BLUE);
    assert_eq!(merged.buffer.pixel(3, 3), RED);
}

#[test]
fn test_text_discard() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = doc.new_layer_id();
    doc.add_layer(
        Layer::text(id, "Title", PixelBuffer::transparent(4, 4)),
        Placement::default(),
    )
    .unwrap();
    let generation = doc.generation();

    text_discard(&mut ActionContext::new(&mut session), &mut doc);

    assert_eq!(doc.layer(id).unwrap().kind, LayerKind::Plain);
    assert_eq!(doc.generation(), generation + 1);

    text_discard(&mut ActionContext::new(&mut session), &mut doc);
    assert_eq!(doc.generation(), generation + 1);
}

#[test]
fn test_crop_to_selection_empty_reports() {
    let mut session = Session::default();
    let mut doc = doc();
    add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));

    crop_to_selection(&mut ActionContext::new(&mut session), &mut doc);

    let messages = messages(&mut session);
    assert_eq!(
        messages[0].text,
        "Cannot crop because the current selection is empty."
    );
    assert_eq!(messages[0].severity, Severity::Warning);
}

#[test]
fn test_crop_to_selection() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));
    doc.set_selection(Selection::rect(40, 30, 2, 3, 5, 4)).unwrap();
    let generation = doc.generation();

    crop_to_selection(&mut ActionContext::new(&mut session), &mut doc);

    let layer = doc.layer(id).unwrap();
    assert_eq!((layer.width(), layer.height()), (5, 4));
    assert_eq!(layer.offset, (2, 3));
    assert_eq!(doc.generation(), generation + 1);
    assert_eq!(doc.undo_labels()[0], "Crop Layer to Selection");
}

#[test]
fn test_crop_to_content_messages() {
    let mut session = Session::default();
    let mut doc = doc();
    // Corners that disagree leave nothing to trim
    let mut full = PixelBuffer::filled(10, 10, RED);
    full.set_pixel(0, 0, BLUE);
    add(&mut doc, "Full", full);
    let generation = doc.generation();

    crop_to_content(&mut ActionContext::new(&mut session), &mut doc);

    assert_eq!(doc.generation(), generation);
    let messages = messages(&mut session);
    assert_eq!(messages[0].severity, Severity::Info);
    assert_eq!(
        messages[0].text,
        "Cannot crop because the active layer is already cropped to its content."
    );

    add(&mut doc, "Empty", PixelBuffer::transparent(10, 10));
    crop_to_content(&mut ActionContext::new(&mut session), &mut doc);
    assert_eq!(
        session.messages.drain()[0].text,
        "Cannot crop because the active layer has no content."
    );
}

#[test]
fn test_resize_dialog_unit_follows_display() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));
    let log = Rc::new(RefCell::new(ProgressLog::default()));
    let mut display = TestDisplay::new(Unit::Millimeter, log);

    resize(&mut ActionContext::with_display(&mut session, &mut display), &mut doc);

    match session.dialogs.get(Some(id), DialogKind::Resize) {
        Some(OpenDialog::Resize(dialog)) => {
            assert_eq!(dialog.unit, Unit::Millimeter);
            assert_eq!((dialog.width, dialog.height), (10, 10));
        }
        other => panic!("expected resize dialog, got {other:?}"),
    }
}

#[test]
fn test_percent_unit_is_kept() {
    let mut session = Session::default();
    session.config.last_used.scale_unit = Unit::Percent;
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));
    let log = Rc::new(RefCell::new(ProgressLog::default()));
    let mut display = TestDisplay::new(Unit::Inch, log);

    scale(&mut ActionContext::with_display(&mut session, &mut display), &mut doc);

    match session.dialogs.get(Some(id), DialogKind::Scale) {
        Some(OpenDialog::Scale(dialog)) => {
            assert_eq!(dialog.unit, Unit::Percent);
            assert_eq!(dialog.interpolation, Interpolation::Cubic);
        }
        other => panic!("expected scale dialog, got {other:?}"),
    }
    assert_eq!(
        session.config.last_used.scale_interpolation,
        Some(Interpolation::Cubic)
    );
}

#[test]
fn test_scale_flow_reports_to_display_progress() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));
    let log = Rc::new(RefCell::new(ProgressLog::default()));
    let mut display = TestDisplay::new(Unit::Pixel, log.clone());

    let mut ctx = ActionContext::with_display(&mut session, &mut display);
    scale(&mut ctx, &mut doc);
    let outcome = respond(
        &mut ctx,
        &mut doc,
        Some(id),
        DialogResponse::Scale(ScaleParams {
            input: GeometryInput::pixels(20.0, 20.0),
            interpolation: Interpolation::Linear,
        }),
    );

    assert_eq!(outcome, Some(DialogOutcome::Close));
    assert_eq!(doc.layer(id).unwrap().width(), 20);
    assert_eq!(doc.layer(id).unwrap().offset, (-5, -5));
    assert_eq!(log.borrow().events, vec!["start:Scaling", "value", "end"]);
    assert_eq!(log.borrow().created, 0);
}

#[test]
fn test_resize_flow_with_invalid_size() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));
    let mut ctx = ActionContext::new(&mut session);

    resize(&mut ctx, &mut doc);
    let generation = doc.generation();
    let outcome = respond(
        &mut ctx,
        &mut doc,
        Some(id),
        DialogResponse::Resize(ResizeParams {
            input: GeometryInput::pixels(0.0, 10.0),
        }),
    );

    assert_eq!(outcome, Some(DialogOutcome::KeepOpen));
    assert_eq!(doc.generation(), generation);
    assert_eq!(doc.layer(id).unwrap().width(), 10);
    let messages = messages(&mut session);
    assert_eq!(messages[0].severity, Severity::Warning);
    assert!(session.dialogs.is_open(Some(id), DialogKind::Resize));
}

#[test]
fn test_resize_to_image() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));

    resize_to_image(&mut ActionContext::new(&mut session), &mut doc);

    let layer = doc.layer(id).unwrap();
    assert_eq!((layer.width(), layer.height()), (40, 30));
    assert_eq!(doc.undo_labels()[0], "Layer to Image Size");
}

#[test]
fn test_mask_add_is_noop_with_mask() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(4, 4, RED));

    mask_add(&mut ActionContext::new(&mut session), &mut doc);
    assert!(session.dialogs.is_open(Some(id), DialogKind::AddMask));
    session.dialogs.close(Some(id), DialogKind::AddMask);

    mask_add_last_values(&mut ActionContext::new(&mut session), &mut doc);
    assert!(doc.layer(id).unwrap().mask.is_some());

    mask_add(&mut ActionContext::new(&mut session), &mut doc);
    assert!(session.dialogs.is_empty());
    assert!(session.messages.is_empty());
}

#[test]
fn test_mask_add_last_values_channel() {
    let mut session = Session::default();
    session.config.dialogs.layer_add_mask_type = AddMaskType::Channel;
    session.config.dialogs.layer_add_mask_invert = true;
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(40, 30, RED));

    // No channel to use: fall back to the dialog
    mask_add_last_values(&mut ActionContext::new(&mut session), &mut doc);
    assert!(doc.layer(id).unwrap().mask.is_none());
    assert!(session.dialogs.is_open(Some(id), DialogKind::AddMask));

    let white = GrayImage::from_pixel(40, 30, image::Luma([255]));
    doc.add_channel(Channel::new("Alpha copy", white)).unwrap();
    mask_add_last_values(&mut ActionContext::new(&mut session), &mut doc);

    let mask = doc.layer(id).unwrap().mask.as_ref().unwrap();
    assert_eq!(mask.value(0, 0), 0);
}

#[test]
fn test_mask_toggles() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(4, 4, RED));
    let generation = doc.generation();

    // Without a mask nothing happens
    mask_show(&mut ActionContext::new(&mut session), &mut doc, true);
    mask_apply(&mut ActionContext::new(&mut session), &mut doc, MaskApplyMode::Discard);
    assert_eq!(doc.generation(), generation);

    mask_add_last_values(&mut ActionContext::new(&mut session), &mut doc);
    mask_show(&mut ActionContext::new(&mut session), &mut doc, true);
    mask_disable(&mut ActionContext::new(&mut session), &mut doc, true);
    mask_edit(&mut ActionContext::new(&mut session), &mut doc, false);

    let mask = doc.layer(id).unwrap().mask.as_ref().unwrap();
    assert!(mask.show);
    assert!(!mask.apply);
    assert!(!mask.edit);

    mask_apply(&mut ActionContext::new(&mut session), &mut doc, MaskApplyMode::Discard);
    assert!(doc.layer(id).unwrap().mask.is_none());
    assert!(session.messages.is_empty());
}

#[test]
fn test_alpha_commands() {
    let mut session = Session::default();
    session.background = BLUE;
    let mut doc = doc();
    let mut buffer = PixelBuffer::filled(4, 4, RED);
    buffer.set_pixel(0, 0, TRANSPARENT);
    let id = add(&mut doc, "Layer", buffer);

    alpha_to_selection(&mut ActionContext::new(&mut session), &mut doc, ChannelOp::Replace);
    assert_eq!(doc.selection().bounds(), Some((0, 0, 4, 4)));
    assert_eq!(doc.selection().value(0, 0), 0);

    alpha_remove(&mut ActionContext::new(&mut session), &mut doc);
    let layer = doc.layer(id).unwrap();
    assert!(!layer.has_alpha);
    assert_eq!(layer.buffer.pixel(0, 0), BLUE);

    alpha_add(&mut ActionContext::new(&mut session), &mut doc);
    assert!(doc.layer(id).unwrap().has_alpha);
}

#[test]
fn test_opacity_changes_compress() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(4, 4, RED));
    let steps = doc.undo_labels().len();

    for _ in 0..3 {
        opacity(&mut ActionContext::new(&mut session), &mut doc, SelectValue::SkipPrevious);
    }

    assert!((doc.layer(id).unwrap().opacity - 0.7).abs() < 1e-9);
    assert_eq!(doc.undo_labels().len(), steps + 1);
    doc.undo();
    assert_eq!(doc.layer(id).unwrap().opacity, 1.0);
}

#[test]
fn test_opacity_on_other_layer_does_not_compress() {
    let mut session = Session::default();
    let mut doc = doc();
    add(&mut doc, "A", PixelBuffer::filled(4, 4, RED));
    opacity(&mut ActionContext::new(&mut session), &mut doc, SelectValue::Previous);
    add(&mut doc, "B", PixelBuffer::filled(4, 4, RED));
    let steps = doc.undo_labels().len();

    opacity(&mut ActionContext::new(&mut session), &mut doc, SelectValue::Previous);

    assert_eq!(doc.undo_labels().len(), steps + 1);
}

#[test]
fn test_mode_steps_through_table() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(4, 4, RED));

    mode(&mut ActionContext::new(&mut session), &mut doc, SelectValue::Next);
    assert_eq!(doc.layer(id).unwrap().mode, LayerMode::Dissolve);

    mode(&mut ActionContext::new(&mut session), &mut doc, SelectValue::Last);
    assert_eq!(doc.layer(id).unwrap().mode, LayerMode::LchLightness);

    mode(&mut ActionContext::new(&mut session), &mut doc, SelectValue::Next);
    assert_eq!(doc.layer(id).unwrap().mode, LayerMode::LchLightness);

    mode(&mut ActionContext::new(&mut session), &mut doc, SelectValue::SetToDefault);
    assert_eq!(doc.layer(id).unwrap().mode, LayerMode::Normal);
    assert_eq!(doc.undo_labels().iter().filter(|l| *l == "Set Layer Mode").count(), 1);
}

#[test]
fn test_lock_alpha_only_on_change() {
    let mut session = Session::default();
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(4, 4, RED));
    let generation = doc.generation();

    lock_alpha(&mut ActionContext::new(&mut session), &mut doc, false);
    assert_eq!(doc.generation(), generation);

    lock_alpha(&mut ActionContext::new(&mut session), &mut doc, true);
    assert!(doc.layer(id).unwrap().lock_alpha);
    assert_eq!(doc.generation(), generation + 1);
    assert_eq!(doc.undo_labels()[0], "Lock Alpha Channel");
}

#[test]
fn test_scale_with_standalone_progress_factory() {
    let factory = RecordingFactory::new();
    let log = factory.log.clone();
    let mut session = Session::with_progress_factory(SessionConfig::default(), Box::new(factory));
    let mut doc = doc();
    let id = add(&mut doc, "Layer", PixelBuffer::filled(10, 10, RED));
    let mut ctx = ActionContext::new(&mut session);

    scale(&mut ctx, &mut doc);
    respond(
        &mut ctx,
        &mut doc,
        Some(id),
        DialogResponse::Scale(ScaleParams {
            input: GeometryInput::pixels(5.0, 5.0),
            interpolation: Interpolation::None,
        }),
    );

    assert_eq!(doc.layer(id).unwrap().width(), 5);
    let log = log.borrow();
    assert_eq!(log.created, 1);
    assert_eq!(log.destroyed, 1);
}
