//! Layerops WASM - WebAssembly bindings for layerops
//!
//! This crate exposes layerops-core document sessions to JavaScript/TypeScript
//! applications.
//!
//! # Module Structure
//!
//! - `session` - A document plus its editing session, driven by layer commands
//! - `types` - WASM-compatible wrapper types for layer pixels
//! - `progress` - Progress reporting to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsLayerSession } from '@layerops/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsLayerSession(640, 480);
//! session.add_layer("Background", 640, 480, rgba, 0, 0);
//! session.crop_to_content();
//! console.log(session.take_messages());
//! ```

use wasm_bindgen::prelude::*;

mod progress;
mod session;
mod types;

// Re-export public types
pub use progress::{ConsoleProgress, ConsoleProgressFactory};
pub use session::JsLayerSession;
pub use types::JsLayerPixels;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
