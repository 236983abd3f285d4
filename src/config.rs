//! Configuration for the sheet controls.
//!
//! Passed from JavaScript as a plain object; every field has a default so an
//! empty object (or `undefined`) wires the controls to the stock page.

use serde::Deserialize;

/// Element ids, storage keys, CSS classes and endpoints used by the controls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Container of the pre-rendered cells.
    pub spreadsheet_id: String,
    /// Single-line compile status indicator.
    pub status_id: String,
    /// Compile log panel (newest entry first).
    pub logs_id: String,
    /// Editor buffer holding `lib.rs`; also its storage key.
    pub lib_rs_id: String,
    /// Editor buffer holding `Cargo.toml`; also its storage key.
    pub cargo_toml_id: String,
    /// Storage key of the remembered compile workspace.
    pub workspace_key: String,
    /// Class on the anchor cell.
    pub selected_class: String,
    /// Class on every cell of the selection rectangle.
    pub range_class: String,
    /// Class on the status element while a compile runs.
    pub loading_class: String,
    /// Class on each log panel entry.
    pub log_entry_class: String,
    /// Production API base URL. `None` means same-origin `/api`.
    pub api_base_url: Option<String>,
    /// API base URL used when the page is served from localhost.
    pub local_api_base_url: String,
    /// `window` property holding the evaluation engine bindings.
    pub bindings_global: String,
    /// `window` property the loaded artifact module is published on.
    pub user_module_global: String,
    pub compile_on_start: bool,
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: "spreadsheet".to_string(),
            status_id: "my-result".to_string(),
            logs_id: "logs".to_string(),
            lib_rs_id: "lib-rs-content".to_string(),
            cargo_toml_id: "cargo-toml-content".to_string(),
            workspace_key: "workspace-id".to_string(),
            selected_class: "selected".to_string(),
            range_class: "in-range".to_string(),
            loading_class: "loading".to_string(),
            log_entry_class: "log-entry".to_string(),
            api_base_url: None,
            local_api_base_url: "http://localhost:8080/api".to_string(),
            bindings_global: "wasmBindings".to_string(),
            user_module_global: "userWasmModule".to_string(),
            compile_on_start: true,
            log_level: "info".to_string(),
        }
    }
}

impl ControlsConfig {
    /// API base URL for a page served from `hostname`.
    #[must_use]
    pub fn api_base_for_host(&self, hostname: &str) -> String {
        if hostname == "localhost" || hostname == "127.0.0.1" {
            return self.local_api_base_url.clone();
        }
        self.api_base_url
            .clone()
            .unwrap_or_else(|| "/api".to_string())
    }

    /// Parsed `log_level`, falling back to `Info`.
    #[must_use]
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

/// Starting `Cargo.toml` for the user's function library.
pub const DEFAULT_CARGO_TOML: &str = r#"[package]
name = "sheeet-lib"
edition = "2024"

[dependencies]
wasm-bindgen = "0.2.100"

[lib]
crate-type = ["cdylib", "rlib"]
"#;

/// Starting `lib.rs` for the user's function library.
pub const DEFAULT_LIB_RS: &str = r"use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

#[wasm_bindgen]
pub fn sub(a: f64, b: f64) -> f64 {
    a - b
}
";
