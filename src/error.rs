//! Structured error types for the sheet controls.
//!
//! Lookup misses (a computed address with no backing cell) are not errors;
//! operations report them as "unchanged" instead.

/// All errors that can occur in the grid controls and the compile client.
#[derive(Debug, thiserror::Error)]
pub enum SheeetError {
    /// Malformed `"<column>-<row>"` cell address.
    #[error("Invalid cell address: {0:?}")]
    Format(String),

    /// Non-success HTTP status from the compile service.
    #[error("HTTP error: {status}")]
    Transport { status: u16 },

    /// A stream line that could not be decoded.
    #[error("Malformed stream line: {0}")]
    Stream(String),

    /// The compile service reported a terminal `error` event.
    #[error("Compile error: {0}")]
    Compile(String),

    /// The evaluation engine is missing or one of its calls failed.
    #[error("Evaluation engine: {0}")]
    Engine(String),

    /// Invalid controls configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON encoding/decoding error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A JavaScript call threw or returned an unexpected value.
    #[error("JavaScript: {0}")]
    Js(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SheeetError>;

impl SheeetError {
    /// Whether the compile service answered "not found" for the workspace.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Transport { status: 404 })
    }
}

#[cfg(target_arch = "wasm32")]
impl From<SheeetError> for wasm_bindgen::JsValue {
    fn from(e: SheeetError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for SheeetError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Js(
            value
                .as_string()
                .unwrap_or_else(|| format!("{value:?}")),
        )
    }
}
