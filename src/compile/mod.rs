//! Compile session client.
//!
//! Sends the two editor buffers to the compile service, streams its
//! newline-delimited JSON response into the log panel, and on success loads
//! the compiled module and installs a fresh evaluation engine. User functions
//! in that module are reached by the engine through `window.js_evaluate`.
//!
//! The protocol and stream decoding are target-independent; the fetch and
//! module-loading driver only exists on `wasm32`.

#[cfg(target_arch = "wasm32")]
mod client;
#[cfg(target_arch = "wasm32")]
mod dispatch;
pub mod protocol;
pub mod stream;

#[cfg(target_arch = "wasm32")]
pub use client::{CompileClient, EditorBuffers, StatusPanel};
#[cfg(target_arch = "wasm32")]
pub use dispatch::{call_user_function, FunctionBridge, EVALUATE_GLOBAL};
pub use protocol::{
    compile_url, parse_event_line, strip_data_prefix, CompileEvent, CompileRequest, DownloadInfo,
    DATA_PREFIX,
};
pub use stream::{CompileSession, LineBuffer, StreamStep};

/// How a compile request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The artifact was loaded; the service's workspace is remembered.
    Ready { workspace_id: String },
    /// The service reported a compile error.
    Failed(String),
}

/// Status line shown while a compile runs.
pub const STATUS_COMPILING: &str = "Compiling";

/// Status line shown once the new engine is ready.
pub const STATUS_READY: &str = "Successfully compiled, enter your expression above.";

#[must_use]
pub fn transport_status_message(status: u16) -> String {
    format!("HTTP error: {status} (try pressing F5)")
}

#[must_use]
pub fn compile_error_message(message: &str) -> String {
    format!("Compile error: {message}")
}
