//! Browser event wiring for the controller.
//!
//! `SheetControls` registers its listeners when constructed - no manual
//! JavaScript wiring required beyond creating it once the grid is rendered.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Event, EventTarget, FocusEvent, KeyboardEvent, MouseEvent};

use super::{Controller, DomGrid, KeyInput, KeyOutcome, Mode};
use crate::compile::{CompileClient, CompileOutcome, EditorBuffers, FunctionBridge};
use crate::config::ControlsConfig;
use crate::engine::{EngineHandle, JsEngine};
use crate::error::SheeetError;

type SharedController = Rc<RefCell<Controller<DomGrid>>>;

/// Install the console logger once; later calls only adjust the level.
fn init_logging(level: log::Level) {
    if console_log::init_with_level(level).is_err() {
        log::set_max_level(level.to_level_filter());
    }
}

/// An event listener that stays registered until dropped.
struct Listener<T: ?Sized> {
    target: EventTarget,
    event: &'static str,
    closure: Closure<T>,
}

impl<T: ?Sized> Listener<T> {
    fn attach(target: &EventTarget, event: &'static str, closure: Closure<T>) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl<T: ?Sized> Drop for Listener<T> {
    fn drop(&mut self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            log::debug!("could not remove {} listener: {err:?}", self.event);
        }
    }
}

/// Grid controls exported to JavaScript. Dropping them (`free()` on the JS
/// side) detaches every listener and unbinds `window.js_evaluate`.
#[wasm_bindgen]
pub struct SheetControls {
    controller: SharedController,
    compiler: CompileClient,
    #[allow(dead_code)]
    mouse_listeners: Vec<Listener<dyn FnMut(MouseEvent)>>,
    #[allow(dead_code)]
    key_listener: Listener<dyn FnMut(KeyboardEvent)>,
    #[allow(dead_code)]
    focus_listener: Listener<dyn FnMut(FocusEvent)>,
    #[allow(dead_code)]
    bridge: FunctionBridge,
}

fn spawn_compile(compiler: CompileClient, persist_buffers: bool) {
    spawn_local(async move {
        if persist_buffers {
            if let Err(err) = compiler.persist_buffers() {
                log::warn!("could not save editor buffers: {err}");
            }
        }
        match compiler.compile().await {
            Ok(CompileOutcome::Ready { .. }) => {}
            Ok(CompileOutcome::Failed(message)) => log::info!("compile failed: {message}"),
            Err(err) => log::warn!("compile did not finish: {err}"),
        }
    });
}

#[wasm_bindgen]
impl SheetControls {
    /// Attach to the rendered grid.
    ///
    /// `config` is an optional plain object overriding [`ControlsConfig`]
    /// fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SheetControls, JsValue> {
        console_error_panic_hook::set_once();

        let config: ControlsConfig = if config.is_undefined() || config.is_null() {
            ControlsConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| SheeetError::Config(e.to_string()))?
        };
        init_logging(config.level());
        let config = Rc::new(config);

        let engine = EngineHandle::new();
        match JsEngine::from_global(&config.bindings_global) {
            Ok(bindings) => {
                engine.install(Rc::new(bindings));
            }
            Err(err) => log::info!("no evaluation engine yet: {err}"),
        }

        let grid = DomGrid::new(&config)?;
        let root = grid.root().clone();
        let controller: SharedController =
            Rc::new(RefCell::new(Controller::new(grid, engine.clone())));
        let compiler = CompileClient::new(Rc::clone(&config), engine);
        let bridge = FunctionBridge::install(&config.user_module_global)?;

        let mut mouse_listeners: Vec<Listener<dyn FnMut(MouseEvent)>> = Vec::new();

        // Mouse down: select, or extend with Shift, and start dragging
        {
            let controller = Rc::clone(&controller);
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                if let Some(cell) = DomGrid::cell_from_target(event.target()) {
                    controller.borrow_mut().pointer_down(cell, event.shift_key());
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            mouse_listeners.push(Listener::attach(&root, "mousedown", closure)?);
        }

        // Mouse over: extend the range while dragging
        {
            let controller = Rc::clone(&controller);
            let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
                if let Some(cell) = DomGrid::cell_from_target(event.target()) {
                    controller.borrow_mut().pointer_enter(cell);
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            mouse_listeners.push(Listener::attach(&root, "mouseover", closure)?);
        }

        let window = web_sys::window().ok_or_else(|| SheeetError::Js("no window".into()))?;

        // Mouse up anywhere ends the drag
        {
            let controller = Rc::clone(&controller);
            let closure = Closure::wrap(Box::new(move |_event: MouseEvent| {
                controller.borrow_mut().pointer_up();
            }) as Box<dyn FnMut(MouseEvent)>);
            mouse_listeners.push(Listener::attach(&window, "mouseup", closure)?);
        }

        // Focus out commits the cell's text
        let focus_listener = {
            let controller = Rc::clone(&controller);
            let closure = Closure::wrap(Box::new(move |event: FocusEvent| {
                let target = event.target();
                let text = target
                    .clone()
                    .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
                    .and_then(|node| node.text_content())
                    .unwrap_or_default();
                let Some(cell) = DomGrid::cell_from_target(target) else {
                    return;
                };
                // A blur issued by the controller itself has already been
                // handled by the call that issued it.
                let Ok(mut controller) = controller.try_borrow_mut() else {
                    log::trace!("nested focusout on {cell} ignored");
                    return;
                };
                controller.focus_out(cell, &text);
            }) as Box<dyn FnMut(FocusEvent)>);
            Listener::attach(&root, "focusout", closure)?
        };

        // Keyboard on window: shortcuts, editing, navigation
        let key_listener = {
            let controller = Rc::clone(&controller);
            let compiler = compiler.clone();
            let root = root.clone();
            let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
                let input = KeyInput::new(
                    &event.key(),
                    event.ctrl_key() || event.meta_key(),
                    event.shift_key(),
                )
                .in_text_field(DomGrid::is_text_field_outside(&root, event.target()));
                let outcome = controller.borrow_mut().key_down(&input);
                if outcome.prevent_default() {
                    let event: &Event = &event;
                    event.prevent_default();
                }
                if outcome == KeyOutcome::Compile {
                    spawn_compile(compiler.clone(), true);
                }
            }) as Box<dyn FnMut(KeyboardEvent)>);
            Listener::attach(&window, "keydown", closure)?
        };

        EditorBuffers::new(&config)?.restore_or_default()?;
        if config.compile_on_start {
            spawn_compile(compiler.clone(), false);
        }

        Ok(SheetControls {
            controller,
            compiler,
            mouse_listeners,
            key_listener,
            focus_listener,
            bridge,
        })
    }

    /// Save the editor buffers and compile them. Resolves with the
    /// workspace id, or rejects with the compile error.
    #[wasm_bindgen]
    pub fn compile(&self) -> Promise {
        let compiler = self.compiler.clone();
        future_to_promise(async move {
            compiler.persist_buffers()?;
            match compiler.compile().await? {
                CompileOutcome::Ready { workspace_id } => Ok(JsValue::from_str(&workspace_id)),
                CompileOutcome::Failed(message) => Err(SheeetError::Compile(message).into()),
            }
        })
    }

    /// Selected addresses in column-major order.
    #[wasm_bindgen(js_name = "selectedCells")]
    pub fn selected_cells(&self) -> Result<JsValue, JsValue> {
        let cells = self.controller.borrow().selected_cells();
        serde_wasm_bindgen::to_value(&cells)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// `"idle"`, `"selected"`, `"editing"` or `"dragging"`.
    #[wasm_bindgen]
    pub fn mode(&self) -> String {
        match self.controller.borrow().mode() {
            Mode::Idle => "idle",
            Mode::Selected => "selected",
            Mode::Editing => "editing",
            Mode::Dragging => "dragging",
        }
        .to_string()
    }

    #[wasm_bindgen(js_name = "clearSelection")]
    pub fn clear_selection(&self) {
        self.controller.borrow_mut().clear_selection();
    }

    /// Number of engines installed so far.
    #[wasm_bindgen(js_name = "engineGeneration")]
    pub fn engine_generation(&self) -> f64 {
        // Generations stay far below 2^53.
        #[allow(clippy::cast_precision_loss)]
        let generation = self.controller.borrow().engine().generation() as f64;
        generation
    }
}
