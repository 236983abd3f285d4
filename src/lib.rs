//! sheeet-ui - spreadsheet interaction layer for the web
//!
//! Drives a pre-rendered grid of cell elements from WebAssembly:
//! - Single-cell and rectangular selection by pointer, arrows and Tab
//! - In-cell editing committed through a swappable evaluation engine
//! - Copy / cut / paste of rectangles with formula translation
//! - Streaming compile of user code into a fresh evaluation engine
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { SheetControls } from 'sheeet-ui';
//! await init();
//! const controls = new SheetControls({ spreadsheet_id: 'spreadsheet' });
//! await controls.compile();
//! ```

pub mod cell_ref;
pub mod clipboard;
pub mod compile;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod types;

use wasm_bindgen::prelude::*;

pub use cell_ref::{Axis, CellAddress, CellRange};
pub use clipboard::{Clipboard, PasteReport};
pub use config::ControlsConfig;
pub use controller::{Controller, GridSurface, KeyInput, KeyOutcome, Mode};
#[cfg(target_arch = "wasm32")]
pub use controller::SheetControls;
pub use engine::{EngineHandle, EvaluationEngine};
pub use error::{Result, SheeetError};
pub use types::*;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
