//! Bridge to the external cell-evaluation engine.
//!
//! The engine is swapped whenever a new compiled artifact is loaded. Holders
//! of an [`EngineHandle`] always see the latest engine; each installation
//! bumps a generation counter so a caller can tell whether the engine it
//! used is still current once its call returns.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell_ref::CellAddress;
use crate::error::{Result, SheeetError};

/// Calls the controls make into the evaluation engine.
pub trait EvaluationEngine {
    /// Raw (unevaluated) text of a cell, e.g. a formula's source.
    fn get_cell_raw_value(&self, cell: CellAddress) -> Result<String>;

    /// Store a raw value and return the display text the engine computed.
    fn set_cell_raw_value(&self, cell: CellAddress, raw: &str) -> Result<String>;

    /// Raw value of `source` as it should read at `target`, with relative
    /// references already translated.
    fn copy_cell_get_raw_value(&self, source: CellAddress, target: CellAddress)
        -> Result<String>;

    /// Persist the sheet; fire-and-forget.
    fn save_app_state(&self) -> Result<()>;

    /// Called once after a new artifact is loaded.
    fn init_app(&self) -> Result<()>;
}

#[derive(Default)]
struct EngineSlot {
    engine: Option<Rc<dyn EvaluationEngine>>,
    generation: u64,
}

/// Shared, swappable reference to the current engine.
#[derive(Clone, Default)]
pub struct EngineHandle {
    slot: Rc<RefCell<EngineSlot>>,
}

/// An engine borrowed from the handle together with its generation.
#[derive(Clone)]
pub struct BoundEngine {
    engine: Rc<dyn EvaluationEngine>,
    generation: u64,
}

impl EngineHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current engine, returning the new generation.
    pub fn install(&self, engine: Rc<dyn EvaluationEngine>) -> u64 {
        let mut slot = self.slot.borrow_mut();
        slot.engine = Some(engine);
        slot.generation = slot.generation.wrapping_add(1);
        log::info!("evaluation engine installed (generation {})", slot.generation);
        slot.generation
    }

    /// The engine to call right now.
    ///
    /// # Errors
    /// Returns [`SheeetError::Engine`] until an engine has been installed.
    pub fn current(&self) -> Result<BoundEngine> {
        let slot = self.slot.borrow();
        let engine = slot
            .engine
            .clone()
            .ok_or_else(|| SheeetError::Engine("no evaluation engine installed".into()))?;
        Ok(BoundEngine {
            engine,
            generation: slot.generation,
        })
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot.borrow().generation
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.slot.borrow().engine.is_some()
    }
}

impl BoundEngine {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `handle` still points at this engine.
    #[must_use]
    pub fn is_current(&self, handle: &EngineHandle) -> bool {
        handle.generation() == self.generation
    }
}

impl std::ops::Deref for BoundEngine {
    type Target = dyn EvaluationEngine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref()
    }
}

#[cfg(target_arch = "wasm32")]
pub use js::JsEngine;

#[cfg(target_arch = "wasm32")]
mod js {
    use js_sys::{Function, Reflect};
    use wasm_bindgen::prelude::*;

    use super::EvaluationEngine;
    use crate::cell_ref::CellAddress;
    use crate::error::{Result, SheeetError};

    /// Engine exposed by a wasm-bindgen module object on `window`.
    pub struct JsEngine {
        bindings: JsValue,
    }

    impl JsEngine {
        /// Bind to `window[name]`.
        pub fn from_global(name: &str) -> Result<Self> {
            let window = web_sys::window().ok_or_else(|| SheeetError::Js("no window".into()))?;
            let bindings = Reflect::get(&window, &JsValue::from_str(name))?;
            if bindings.is_undefined() || bindings.is_null() {
                return Err(SheeetError::Engine(format!("window.{name} is not defined")));
            }
            Ok(Self { bindings })
        }

        fn function(&self, name: &str) -> Result<Function> {
            Reflect::get(&self.bindings, &JsValue::from_str(name))?
                .dyn_into::<Function>()
                .map_err(|_| SheeetError::Engine(format!("{name} is not a function")))
        }

        fn call_string(&self, name: &str, args: &[JsValue]) -> Result<String> {
            let function = self.function(name)?;
            let value = match args {
                [a] => function.call1(&JsValue::NULL, a)?,
                [a, b] => function.call2(&JsValue::NULL, a, b)?,
                _ => function.call0(&JsValue::NULL)?,
            };
            value
                .as_string()
                .ok_or_else(|| SheeetError::Engine(format!("{name} did not return a string")))
        }

        fn call_unit(&self, name: &str) -> Result<()> {
            self.function(name)?.call0(&JsValue::NULL)?;
            Ok(())
        }
    }

    fn address(cell: CellAddress) -> JsValue {
        JsValue::from_str(&cell.to_string())
    }

    impl EvaluationEngine for JsEngine {
        fn get_cell_raw_value(&self, cell: CellAddress) -> Result<String> {
            self.call_string("get_cell_raw_value", &[address(cell)])
        }

        fn set_cell_raw_value(&self, cell: CellAddress, raw: &str) -> Result<String> {
            self.call_string("set_cell_raw_value", &[address(cell), JsValue::from_str(raw)])
        }

        fn copy_cell_get_raw_value(
            &self,
            source: CellAddress,
            target: CellAddress,
        ) -> Result<String> {
            self.call_string("copy_cell_get_raw_value", &[address(source), address(target)])
        }

        fn save_app_state(&self) -> Result<()> {
            self.call_unit("save_app_state_to_local_storage")
        }

        fn init_app(&self) -> Result<()> {
            self.call_unit("init_app")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl EvaluationEngine for Fixed {
        fn get_cell_raw_value(&self, _cell: CellAddress) -> Result<String> {
            Ok(self.0.to_string())
        }
        fn set_cell_raw_value(&self, _cell: CellAddress, raw: &str) -> Result<String> {
            Ok(raw.to_string())
        }
        fn copy_cell_get_raw_value(&self, _s: CellAddress, _t: CellAddress) -> Result<String> {
            Ok(self.0.to_string())
        }
        fn save_app_state(&self) -> Result<()> {
            Ok(())
        }
        fn init_app(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_engine() {
        let handle = EngineHandle::new();
        assert!(!handle.is_installed());
        assert!(matches!(handle.current(), Err(SheeetError::Engine(_))));
    }

    #[test]
    fn test_install_bumps_generation() {
        let handle = EngineHandle::new();
        let shared = handle.clone();
        assert_eq!(handle.install(Rc::new(Fixed("old"))), 1);

        let old = shared.current().unwrap();
        assert_eq!(old.get_cell_raw_value(CellAddress::new(0, 0)).unwrap(), "old");
        assert!(old.is_current(&handle));

        assert_eq!(shared.install(Rc::new(Fixed("new"))), 2);
        assert!(!old.is_current(&handle));
        // A stale engine still answers; the caller decides what to do with it.
        assert_eq!(old.get_cell_raw_value(CellAddress::new(0, 0)).unwrap(), "old");
        let new = handle.current().unwrap();
        assert_eq!(new.generation(), 2);
        assert_eq!(new.get_cell_raw_value(CellAddress::new(0, 0)).unwrap(), "new");
    }
}
