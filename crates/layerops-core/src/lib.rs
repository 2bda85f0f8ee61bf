//! Layerops Core - layer commands for layered image documents
//!
//! This crate provides the layer actions of an image editor: creating,
//! stacking, merging and deleting layers, masks and alpha, layer properties,
//! and the geometry changes (resize, scale, crop) that run through a shared
//! orchestrator with scoped undo groups and progress.
//!
//! Actions live in [`commands`] and take an [`ActionContext`] plus the
//! [`Document`] they act on. They never return errors; failures end up in
//! the session's [`MessageLog`].

pub mod buffer;
pub mod commands;
pub mod config;
pub mod dialogs;
pub mod document;
pub mod error;
pub mod geometry;
pub mod message;
pub mod progress;
pub mod session;
pub mod undo;

pub use buffer::{Interpolation, PixelBuffer, Rgba};
pub use config::{ConfigError, SessionConfig};
pub use dialogs::{respond, DialogKind, DialogOutcome, DialogResponse, OpenDialog};
pub use document::{Document, Layer, LayerId, LayerMode};
pub use error::CommandError;
pub use geometry::{GeometryHost, GeometryInput, GeometryOutcome, GeometryRequest, ItemRef, Unit};
pub use message::{Message, MessageLog, Severity};
pub use progress::{Progress, ProgressFactory, ProgressScope};
pub use session::{ActionContext, Display, Session};
pub use undo::UndoKind;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_round_trip() {
        let mut session = Session::default();
        let mut doc = session.new_document(16, 16).unwrap();
        let id = doc.new_layer_id();
        doc.add_layer(
            Layer::from_buffer(id, "Paint", PixelBuffer::filled(8, 8, [10, 20, 30, 255])),
            Default::default(),
        )
        .unwrap();

        let mut ctx = ActionContext::new(&mut session);
        commands::scale(&mut ctx, &mut doc);
        let outcome = respond(
            &mut ctx,
            &mut doc,
            Some(id),
            DialogResponse::Scale(dialogs::ScaleParams {
                input: GeometryInput::pixels(4.0, 2.0),
                interpolation: Interpolation::None,
            }),
        );

        assert_eq!(outcome, Some(DialogOutcome::Close));
        let layer = doc.layer(id).unwrap();
        assert_eq!((layer.width(), layer.height()), (4, 2));
        assert_eq!(layer.buffer.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(doc.undo().as_deref(), Some("Scale Layer"));
        assert!(session.messages.is_empty());
    }
}
