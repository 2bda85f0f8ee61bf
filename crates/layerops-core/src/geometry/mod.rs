//! Geometry changes for layers and masks: resize, scale and crop.
//!
//! [`resolve`] turns raw dialog input into a validated [`GeometryRequest`].
//! The orchestrator functions then apply it to any [`GeometryHost`], so the
//! same sequencing serves the document and test doubles alike.

mod host;
mod orchestrator;
mod request;

pub use host::{GeometryHost, ItemRef};
pub use orchestrator::{crop_to_content, crop_to_rect, resize, scale, GeometryOutcome, UndoGroup};
pub use request::{resolve, GeometryInput, GeometryRequest, Unit, MAX_DIMENSION};
