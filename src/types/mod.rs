//! Data types for the grid controls.

mod selection;
mod transfer;

pub use selection::*;
pub use transfer::*;
