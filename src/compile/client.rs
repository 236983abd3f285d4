//! Fetch-based driver for the compile session (wasm32 only).

use std::rc::Rc;

use js_sys::{Function, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, ReadableStreamDefaultReader, Request, RequestInit, RequestMode, Response,
    Storage, Window,
};

use super::{
    compile_error_message, compile_url, transport_status_message, CompileOutcome, CompileRequest,
    CompileSession, DownloadInfo, StreamStep, STATUS_COMPILING, STATUS_READY,
};
use crate::config::{ControlsConfig, DEFAULT_CARGO_TOML, DEFAULT_LIB_RS};
use crate::engine::{EngineHandle, JsEngine};
use crate::error::{Result, SheeetError};

#[wasm_bindgen(inline_js = "export function import_module(url) { return import(url); }")]
extern "C" {
    fn import_module(url: &str) -> Promise;
}

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| SheeetError::Js("no window".into()))
}

fn document(window: &Window) -> Result<Document> {
    window
        .document()
        .ok_or_else(|| SheeetError::Js("no document".into()))
}

fn local_storage(window: &Window) -> Result<Storage> {
    window
        .local_storage()?
        .ok_or_else(|| SheeetError::Js("local storage unavailable".into()))
}

/// Stop reading the response body once the session has its result.
async fn cancel(reader: &ReadableStreamDefaultReader) {
    if let Err(err) = JsFuture::from(reader.cancel()).await {
        log::debug!("response body cancel failed: {err:?}");
    }
}

/// Status line and log panel of the compile UI.
pub struct StatusPanel {
    status: Option<Element>,
    logs: Option<Element>,
    document: Document,
    loading_class: String,
    entry_class: String,
}

impl StatusPanel {
    pub fn new(config: &ControlsConfig) -> Result<Self> {
        let document = document(&window()?)?;
        Ok(Self {
            status: document.get_element_by_id(&config.status_id),
            logs: document.get_element_by_id(&config.logs_id),
            document,
            loading_class: config.loading_class.clone(),
            entry_class: config.log_entry_class.clone(),
        })
    }

    pub fn set_status(&self, message: &str, loading: bool) {
        let Some(status) = &self.status else {
            log::info!("{message}");
            return;
        };
        status.set_text_content(Some(message));
        status.set_class_name(if loading { &self.loading_class } else { "" });
    }

    /// Prepend one entry; the newest line is shown first.
    pub fn append_log(&self, message: &str) {
        let Some(logs) = &self.logs else {
            log::info!("{message}");
            return;
        };
        let entry = match self.document.create_element("p") {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("log entry not created: {err:?}");
                return;
            }
        };
        entry.set_text_content(Some(message));
        entry.set_class_name(&self.entry_class);
        if let Err(err) = logs.prepend_with_node_1(&entry) {
            log::warn!("log entry not shown: {err:?}");
        }
        logs.set_scroll_top(logs.scroll_height());
    }
}

/// The two source buffers edited on the page, persisted in local storage
/// under their element ids.
pub struct EditorBuffers {
    document: Document,
    storage: Storage,
    lib_rs_id: String,
    cargo_toml_id: String,
}

impl EditorBuffers {
    pub fn new(config: &ControlsConfig) -> Result<Self> {
        let window = window()?;
        Ok(Self {
            document: document(&window)?,
            storage: local_storage(&window)?,
            lib_rs_id: config.lib_rs_id.clone(),
            cargo_toml_id: config.cargo_toml_id.clone(),
        })
    }

    fn text(&self, id: &str) -> String {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.text_content())
            .unwrap_or_default()
    }

    pub fn lib_rs(&self) -> String {
        self.text(&self.lib_rs_id)
    }

    pub fn cargo_toml(&self) -> String {
        self.text(&self.cargo_toml_id)
    }

    /// Write both buffers to storage.
    pub fn persist(&self) -> Result<()> {
        for id in [&self.lib_rs_id, &self.cargo_toml_id] {
            self.storage.set_item(id, &self.text(id))?;
        }
        Ok(())
    }

    /// Fill both buffers from storage, falling back to the starter templates.
    pub fn restore_or_default(&self) -> Result<()> {
        for (id, default) in [
            (&self.cargo_toml_id, DEFAULT_CARGO_TOML),
            (&self.lib_rs_id, DEFAULT_LIB_RS),
        ] {
            let content = self
                .storage
                .get_item(id)?
                .filter(|stored| !stored.is_empty())
                .unwrap_or_else(|| default.to_string());
            if let Some(element) = self.document.get_element_by_id(id) {
                element.set_text_content(Some(&content));
            }
            self.storage.set_item(id, &content)?;
        }
        Ok(())
    }
}

/// Issues compile requests and installs the resulting engine.
#[derive(Clone)]
pub struct CompileClient {
    config: Rc<ControlsConfig>,
    engine: EngineHandle,
}

impl CompileClient {
    pub fn new(config: Rc<ControlsConfig>, engine: EngineHandle) -> Self {
        Self { config, engine }
    }

    fn api_base(&self, window: &Window) -> String {
        let hostname = window.location().hostname().unwrap_or_default();
        self.config.api_base_for_host(&hostname)
    }

    /// Save the current editor buffers so a reload restores them.
    pub fn persist_buffers(&self) -> Result<()> {
        EditorBuffers::new(&self.config)?.persist()
    }

    /// Run one compile to completion, reporting progress on the status panel.
    pub async fn compile(&self) -> Result<CompileOutcome> {
        let panel = StatusPanel::new(&self.config)?;
        panel.set_status(STATUS_COMPILING, true);
        let result = self.run(&panel).await;
        match &result {
            Ok(CompileOutcome::Ready { workspace_id }) => {
                log::info!("compile finished, workspace {workspace_id}");
                panel.set_status(STATUS_READY, false);
            }
            Ok(CompileOutcome::Failed(message)) => {
                panel.set_status(&compile_error_message(message), false);
            }
            Err(SheeetError::Transport { status }) => {
                panel.set_status(&transport_status_message(*status), false);
            }
            Err(err) => {
                log::error!("compile failed: {err}");
                panel.set_status(&err.to_string(), false);
            }
        }
        result
    }

    async fn run(&self, panel: &StatusPanel) -> Result<CompileOutcome> {
        let window = window()?;
        let storage = local_storage(&window)?;
        let buffers = EditorBuffers::new(&self.config)?;
        let base = self.api_base(&window);

        let workspace = storage.get_item(&self.config.workspace_key)?;
        let url = compile_url(&base, workspace.as_deref());
        let lib_rs = buffers.lib_rs();
        let cargo_toml = buffers.cargo_toml();
        let body = serde_json::to_string(&CompileRequest {
            lib_rs: &lib_rs,
            cargo_toml: &cargo_toml,
        })?;

        let init = RequestInit::new();
        init.set_method("PUT");
        init.set_mode(RequestMode::Cors);
        init.set_body(&JsValue::from_str(&body));
        let request = Request::new_with_str_and_init(&url, &init)?;
        request.headers().set("Content-Type", "application/json")?;

        log::debug!("PUT {url}");
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        if !response.ok() {
            let err = SheeetError::Transport {
                status: response.status(),
            };
            if err.is_not_found() {
                log::warn!("workspace {workspace:?} not found, starting fresh next time");
                storage.remove_item(&self.config.workspace_key)?;
            }
            return Err(err);
        }

        let body = response
            .body()
            .ok_or_else(|| SheeetError::Stream("response has no body".into()))?;
        let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
        let mut session = CompileSession::new();

        loop {
            let chunk = JsFuture::from(reader.read()).await?;
            let done = Reflect::get(&chunk, &JsValue::from_str("done"))?
                .as_bool()
                .unwrap_or(true);
            let steps = if done {
                session.finish()
            } else {
                let value = Reflect::get(&chunk, &JsValue::from_str("value"))?;
                session.feed(&Uint8Array::new(&value).to_vec())
            };

            for step in steps {
                match step {
                    StreamStep::Log(line) => panel.append_log(&line),
                    StreamStep::Violation(raw) => {
                        log::error!("unknown compile stream event: {raw}");
                    }
                    StreamStep::Malformed(err) => {
                        log::error!("{err}");
                        panel.append_log(&err.to_string());
                    }
                    StreamStep::Failed(message) => {
                        cancel(&reader).await;
                        return Ok(CompileOutcome::Failed(message));
                    }
                    StreamStep::Ready(info) => {
                        cancel(&reader).await;
                        self.load_artifact(&window, &base, &info).await?;
                        storage.set_item(&self.config.workspace_key, &info.workspace_id)?;
                        self.install_engine()?;
                        return Ok(CompileOutcome::Ready {
                            workspace_id: info.workspace_id,
                        });
                    }
                }
            }

            if done {
                break;
            }
        }

        Err(SheeetError::Stream(
            "compile stream ended without a result".into(),
        ))
    }

    /// Import the generated JS glue, initialise it with the wasm URL and
    /// publish the module for the evaluation engine to call into.
    async fn load_artifact(&self, window: &Window, base: &str, info: &DownloadInfo) -> Result<()> {
        let js_url = format!("{base}{}", info.js_download_url);
        let wasm_url = format!("{base}{}", info.wasm_download_url);
        log::debug!("loading artifact {js_url}");

        let module = JsFuture::from(import_module(&js_url)).await?;
        let init: Function = Reflect::get(&module, &JsValue::from_str("default"))?.dyn_into()?;
        let options = Object::new();
        Reflect::set(
            &options,
            &JsValue::from_str("module_or_path"),
            &JsValue::from_str(&wasm_url),
        )?;
        let started = init.call1(&JsValue::NULL, &options)?;
        JsFuture::from(Promise::resolve(&started)).await?;

        Reflect::set(
            window,
            &JsValue::from_str(&self.config.user_module_global),
            &module,
        )?;
        Ok(())
    }

    fn install_engine(&self) -> Result<()> {
        let engine = JsEngine::from_global(&self.config.bindings_global)?;
        self.engine.install(Rc::new(engine));
        self.engine.current()?.init_app()
    }
}
