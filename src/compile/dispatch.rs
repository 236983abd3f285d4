//! `window.js_evaluate`, through which the evaluation engine calls the user
//! functions exported by the compiled artifact (wasm32 only).

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::Window;

use crate::error::{Result, SheeetError};

/// Global the evaluation engine imports its function dispatcher from.
pub const EVALUATE_GLOBAL: &str = "js_evaluate";

type Dispatch = dyn Fn(String, Array) -> std::result::Result<JsValue, JsValue>;

/// Call `window[module_global][name](...args)` with the module as `this`.
///
/// # Errors
/// Returns [`SheeetError::Engine`] when no artifact is loaded or it does
/// not export `name`, and [`SheeetError::Js`] when the function throws.
pub fn call_user_function(module_global: &str, name: &str, args: &Array) -> Result<JsValue> {
    let window = web_sys::window().ok_or_else(|| SheeetError::Js("no window".into()))?;
    let module = Reflect::get(&window, &JsValue::from_str(module_global))?;
    if module.is_undefined() || module.is_null() {
        return Err(SheeetError::Engine(format!(
            "{name}: no compiled module on window.{module_global}"
        )));
    }
    let function: Function = Reflect::get(&module, &JsValue::from_str(name))?
        .dyn_into()
        .map_err(|_| SheeetError::Engine(format!("{name} is not exported by the compiled module")))?;
    Ok(function.apply(&module, args)?)
}

/// Keeps `window.js_evaluate` bound for as long as it lives.
pub struct FunctionBridge {
    window: Window,
    closure: Closure<Dispatch>,
}

impl FunctionBridge {
    /// Publish the dispatcher, looking functions up on `window[module_global]`
    /// at call time so a recompiled module is picked up without rebinding.
    pub fn install(module_global: &str) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| SheeetError::Js("no window".into()))?;
        let module_global = module_global.to_string();
        let closure = Closure::wrap(Box::new(move |name: String, args: Array| {
            call_user_function(&module_global, &name, &args).map_err(|err| {
                log::warn!("user function {name} failed: {err}");
                JsValue::from(err)
            })
        }) as Box<Dispatch>);
        Reflect::set(
            &window,
            &JsValue::from_str(EVALUATE_GLOBAL),
            closure.as_ref(),
        )?;
        Ok(Self { window, closure })
    }
}

impl Drop for FunctionBridge {
    fn drop(&mut self) {
        let key = JsValue::from_str(EVALUATE_GLOBAL);
        // Leave a dispatcher installed by someone else in place.
        let ours = Reflect::get(&self.window, &key)
            .is_ok_and(|current| current == *self.closure.as_ref());
        if ours {
            if let Err(err) = Reflect::delete_property(&self.window, &key) {
                log::debug!("could not unbind window.{EVALUATE_GLOBAL}: {err:?}");
            }
        }
    }
}
