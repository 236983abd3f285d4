//! Common test utilities: an in-memory grid and evaluation engine.
//!
//! `MemoryGrid` stands in for the rendered cell elements and records every
//! visual side effect. `MemoryEngine` keeps raw values in a map and shows
//! formulas (text starting with `=`) wrapped in brackets.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use sheeet_ui::cell_ref::CellAddress;
use sheeet_ui::controller::{CellMark, Controller, GridSurface};
use sheeet_ui::engine::{EngineHandle, EvaluationEngine};
use sheeet_ui::error::{Result, SheeetError};

#[must_use]
pub fn at(col: i64, row: i64) -> CellAddress {
    CellAddress::new(col, row)
}

// ============================================================================
// Grid
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryGrid {
    pub cells: BTreeMap<CellAddress, String>,
    pub marks: HashSet<(CellAddress, CellMark)>,
    pub editable: HashSet<CellAddress>,
    pub focused: Option<CellAddress>,
    pub released: Vec<CellAddress>,
    pub scrolled: Vec<CellAddress>,
}

impl MemoryGrid {
    /// Empty cells for columns and rows `1..=cols` and `1..=rows`.
    #[must_use]
    pub fn with_size(cols: i64, rows: i64) -> Self {
        let mut grid = Self::default();
        for col in 1..=cols {
            for row in 1..=rows {
                grid.cells.insert(at(col, row), String::new());
            }
        }
        grid
    }

    #[must_use]
    pub fn shown(&self, col: i64, row: i64) -> &str {
        self.cells.get(&at(col, row)).map_or("", String::as_str)
    }

    #[must_use]
    pub fn has_mark(&self, col: i64, row: i64, mark: CellMark) -> bool {
        self.marks.contains(&(at(col, row), mark))
    }

    /// Cells carrying `mark`, sorted.
    #[must_use]
    pub fn marked(&self, mark: CellMark) -> Vec<CellAddress> {
        let mut cells: Vec<_> = self
            .marks
            .iter()
            .filter(|(_, m)| *m == mark)
            .map(|(c, _)| *c)
            .collect();
        cells.sort();
        cells
    }
}

impl GridSurface for MemoryGrid {
    fn has_cell(&self, cell: CellAddress) -> bool {
        self.cells.contains_key(&cell)
    }

    fn text(&self, cell: CellAddress) -> Option<String> {
        self.cells.get(&cell).cloned()
    }

    fn set_text(&mut self, cell: CellAddress, text: &str) {
        if let Some(slot) = self.cells.get_mut(&cell) {
            *slot = text.to_string();
        }
    }

    fn set_editable(&mut self, cell: CellAddress, editable: bool) {
        if editable {
            self.editable.insert(cell);
        } else {
            self.editable.remove(&cell);
        }
    }

    fn focus(&mut self, cell: CellAddress) {
        self.focused = Some(cell);
    }

    fn release_focus(&mut self, cell: CellAddress) {
        if self.focused == Some(cell) {
            self.focused = None;
        }
        self.released.push(cell);
    }

    fn set_mark(&mut self, cell: CellAddress, mark: CellMark, on: bool) {
        if !self.has_cell(cell) {
            return;
        }
        if on {
            self.marks.insert((cell, mark));
        } else {
            self.marks.remove(&(cell, mark));
        }
    }

    fn scroll_into_view(&mut self, cell: CellAddress) {
        self.scrolled.push(cell);
    }
}

// ============================================================================
// Engine
// ============================================================================

/// One call into the engine, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Get(CellAddress),
    Set(CellAddress, String),
    Copy(CellAddress, CellAddress),
    Save,
    Init,
}

#[derive(Debug, Default)]
pub struct MemoryEngine {
    pub raw: RefCell<BTreeMap<CellAddress, String>>,
    pub calls: RefCell<Vec<EngineCall>>,
}

impl MemoryEngine {
    #[must_use]
    pub fn display(raw: &str) -> String {
        if raw.starts_with('=') {
            format!("[{raw}]")
        } else {
            raw.to_string()
        }
    }

    pub fn put(&self, col: i64, row: i64, raw: &str) {
        self.raw.borrow_mut().insert(at(col, row), raw.to_string());
    }

    #[must_use]
    pub fn raw_at(&self, col: i64, row: i64) -> String {
        self.raw
            .borrow()
            .get(&at(col, row))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn sets(&self) -> Vec<(CellAddress, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Set(cell, raw) => Some((*cell, raw.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn forget_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl EvaluationEngine for MemoryEngine {
    fn get_cell_raw_value(&self, cell: CellAddress) -> Result<String> {
        self.calls.borrow_mut().push(EngineCall::Get(cell));
        Ok(self.raw.borrow().get(&cell).cloned().unwrap_or_default())
    }

    fn set_cell_raw_value(&self, cell: CellAddress, raw: &str) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(EngineCall::Set(cell, raw.to_string()));
        if raw.is_empty() {
            self.raw.borrow_mut().remove(&cell);
        } else {
            self.raw.borrow_mut().insert(cell, raw.to_string());
        }
        Ok(Self::display(raw))
    }

    /// Formulas gain a `@dc,dr` suffix naming the shift applied.
    fn copy_cell_get_raw_value(&self, source: CellAddress, target: CellAddress) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(EngineCall::Copy(source, target));
        let raw = self.raw.borrow().get(&source).cloned().unwrap_or_default();
        if raw.starts_with('=') {
            Ok(format!(
                "{raw}@{},{}",
                target.col - source.col,
                target.row - source.row
            ))
        } else {
            Ok(raw)
        }
    }

    fn save_app_state(&self) -> Result<()> {
        self.calls.borrow_mut().push(EngineCall::Save);
        Ok(())
    }

    fn init_app(&self) -> Result<()> {
        self.calls.borrow_mut().push(EngineCall::Init);
        Ok(())
    }
}

/// Engine whose every call fails.
#[derive(Debug, Default)]
pub struct BrokenEngine;

impl EvaluationEngine for BrokenEngine {
    fn get_cell_raw_value(&self, _cell: CellAddress) -> Result<String> {
        Err(SheeetError::Engine("broken".into()))
    }

    fn set_cell_raw_value(&self, _cell: CellAddress, _raw: &str) -> Result<String> {
        Err(SheeetError::Engine("broken".into()))
    }

    fn copy_cell_get_raw_value(&self, _source: CellAddress, _target: CellAddress) -> Result<String> {
        Err(SheeetError::Engine("broken".into()))
    }

    fn save_app_state(&self) -> Result<()> {
        Err(SheeetError::Engine("broken".into()))
    }

    fn init_app(&self) -> Result<()> {
        Err(SheeetError::Engine("broken".into()))
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// A controller over a `cols` x `rows` grid with a fresh engine installed.
#[must_use]
pub fn controller(cols: i64, rows: i64) -> (Controller<MemoryGrid>, Rc<MemoryEngine>) {
    let engine = Rc::new(MemoryEngine::default());
    let handle = EngineHandle::new();
    handle.install(Rc::clone(&engine) as Rc<dyn EvaluationEngine>);
    (Controller::new(MemoryGrid::with_size(cols, rows), handle), engine)
}

/// Put a raw value into the engine and show its display text in the grid.
pub fn seed(
    controller: &mut Controller<MemoryGrid>,
    engine: &MemoryEngine,
    col: i64,
    row: i64,
    raw: &str,
) {
    engine.put(col, row, raw);
    controller
        .grid_mut()
        .set_text(at(col, row), &MemoryEngine::display(raw));
}
