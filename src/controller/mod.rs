//! Input controller: turns pointer and keyboard gestures into selection,
//! clipboard and evaluation-engine calls.
//!
//! The decision logic here never touches the DOM directly. Everything
//! visual goes through [`GridSurface`], which the browser build implements
//! over the pre-rendered cell elements and tests implement in memory.
//!
//! All handlers run synchronously inside one input event. They must not be
//! re-entered from a side effect they cause (a `blur()` firing `focusout`,
//! for example); the DOM layer drops such nested events.

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod events;
pub mod keys;

#[cfg(target_arch = "wasm32")]
pub use dom::DomGrid;
#[cfg(target_arch = "wasm32")]
pub use events::SheetControls;
pub use keys::{Key, KeyInput, Shortcut};

use crate::cell_ref::{Axis, CellAddress, CellRange};
use crate::clipboard::Clipboard;
use crate::engine::{BoundEngine, EngineHandle};
use crate::types::Selection;

/// Visual decoration a cell can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellMark {
    /// The selection anchor.
    Anchor,
    /// Any cell of the selection rectangle.
    Range,
}

/// The rendered grid, one element per addressable cell.
///
/// Addresses without a backing cell are silently ignored by every mutator.
pub trait GridSurface {
    fn has_cell(&self, cell: CellAddress) -> bool;
    /// Displayed text, `None` when there is no such cell.
    fn text(&self, cell: CellAddress) -> Option<String>;
    fn set_text(&mut self, cell: CellAddress, text: &str);
    fn set_editable(&mut self, cell: CellAddress, editable: bool);
    fn focus(&mut self, cell: CellAddress);
    /// Drop input focus from the cell.
    fn release_focus(&mut self, cell: CellAddress);
    fn set_mark(&mut self, cell: CellAddress, mark: CellMark, on: bool);
    fn scroll_into_view(&mut self, cell: CellAddress);
}

/// Input state, derived from the selection and pointer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Nothing selected.
    Idle,
    /// A cell or range is selected.
    Selected,
    /// The anchor cell accepts text input.
    Editing,
    /// Pointer held down; moving over cells extends the range.
    Dragging,
}

/// Result of a keydown, telling the event layer what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not ours; leave the browser default alone.
    Ignored,
    /// Consumed; suppress the browser default.
    Handled,
    /// Consumed; persist the editor buffers and start a compile.
    Compile,
}

impl KeyOutcome {
    #[must_use]
    pub fn prevent_default(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Selection and clipboard state of one editing session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub selection: Selection,
    pub clipboard: Clipboard,
}

pub struct Controller<G: GridSurface> {
    session: Session,
    grid: G,
    engine: EngineHandle,
    dragging: bool,
    /// Text shown before editing began, restored on Escape.
    edit_origin: Option<String>,
}

/// Store a raw value, returning the engine's display text.
fn store(engine: &BoundEngine, cell: CellAddress, raw: &str) -> Option<String> {
    match engine.set_cell_raw_value(cell, raw) {
        Ok(display) => Some(display),
        Err(err) => {
            log::error!("failed to set {cell}: {err}");
            None
        }
    }
}

impl<G: GridSurface> Controller<G> {
    pub fn new(grid: G, engine: EngineHandle) -> Self {
        Self {
            session: Session::default(),
            grid,
            engine,
            dragging: false,
            edit_origin: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        let selection = &self.session.selection;
        if selection.is_editing() {
            Mode::Editing
        } else if self.dragging {
            Mode::Dragging
        } else if selection.is_empty() {
            Mode::Idle
        } else {
            Mode::Selected
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut G {
        &mut self.grid
    }

    #[must_use]
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Every selected address in column-major order.
    #[must_use]
    pub fn selected_cells(&self) -> Vec<CellAddress> {
        self.session
            .selection
            .current_rectangle()
            .map(|rect| rect.cells().collect())
            .unwrap_or_default()
    }

    /// Apply a selection change and bring the decorations in line with it.
    fn update_selection(&mut self, change: impl FnOnce(&mut Selection)) {
        let before_rect = self.session.selection.current_rectangle();
        let before_anchor = self.session.selection.anchor();
        let before_focus = self.session.selection.focus();
        change(&mut self.session.selection);
        let after_rect = self.session.selection.current_rectangle();
        let after_anchor = self.session.selection.anchor();
        let after_focus = self.session.selection.focus();

        if before_rect != after_rect {
            self.mark_difference(before_rect, after_rect, false);
            self.mark_difference(after_rect, before_rect, true);
        }
        if before_anchor != after_anchor {
            if let Some(cell) = before_anchor {
                self.grid.set_mark(cell, CellMark::Anchor, false);
            }
            if let Some(cell) = after_anchor {
                self.grid.set_mark(cell, CellMark::Anchor, true);
            }
        }
        if before_focus != after_focus {
            if let Some(cell) = after_focus {
                self.grid.scroll_into_view(cell);
            }
        }
    }

    /// Set the range mark on cells of `from` that are not in `except`.
    fn mark_difference(&mut self, from: Option<CellRange>, except: Option<CellRange>, on: bool) {
        let Some(from) = from else {
            return;
        };
        for cell in from.cells() {
            if !except.is_some_and(|rect| rect.contains(cell)) {
                self.grid.set_mark(cell, CellMark::Range, on);
            }
        }
    }

    // ------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------

    /// Pointer pressed on a cell. Shift extends from the anchor.
    pub fn pointer_down(&mut self, cell: CellAddress, shift: bool) {
        if !self.grid.has_cell(cell) {
            return;
        }
        if self.session.selection.is_editing() {
            if self.session.selection.anchor() == Some(cell) {
                // Caret placement inside the cell being edited.
                return;
            }
            self.finish_edit(true);
        }
        self.dragging = true;
        if shift && !self.session.selection.is_empty() {
            self.update_selection(|s| s.extend_to(cell));
        } else {
            self.update_selection(|s| s.select_single(cell));
        }
    }

    /// Pointer moved onto a cell.
    pub fn pointer_enter(&mut self, cell: CellAddress) {
        if !self.dragging || !self.grid.has_cell(cell) {
            return;
        }
        self.update_selection(|s| s.extend_to(cell));
    }

    /// Pointer released anywhere.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// A cell lost input focus. Its text is committed whatever the mode.
    pub fn focus_out(&mut self, cell: CellAddress, text: &str) {
        if self.session.selection.is_editing() && self.session.selection.anchor() == Some(cell) {
            self.session.selection.end_edit();
            self.edit_origin = None;
            self.grid.set_editable(cell, false);
        }
        self.commit(cell, text);
    }

    /// Send trimmed text to the engine and show what it returns.
    fn commit(&mut self, cell: CellAddress, text: &str) {
        let engine = match self.engine.current() {
            Ok(engine) => engine,
            Err(err) => {
                log::warn!("cannot commit {cell}: {err}");
                return;
            }
        };
        let Some(display) = store(&engine, cell, text.trim()) else {
            return;
        };
        if !engine.is_current(&self.engine) {
            log::warn!(
                "engine replaced while committing {cell} (generation {})",
                engine.generation()
            );
        }
        self.grid.set_text(cell, &display);
    }

    fn begin_edit(&mut self) {
        let Some(cell) = self.session.selection.anchor() else {
            return;
        };
        let shown = self.grid.text(cell).unwrap_or_default();
        if !shown.trim().is_empty() {
            match self
                .engine
                .current()
                .and_then(|engine| engine.get_cell_raw_value(cell))
            {
                Ok(raw) => self.grid.set_text(cell, &raw),
                Err(err) => log::warn!("editing displayed text of {cell}: {err}"),
            }
        }
        self.edit_origin = Some(shown);
        self.session.selection.begin_edit();
        self.grid.set_editable(cell, true);
        self.grid.focus(cell);
        log::debug!("editing {cell}");
    }

    /// Leave editing mode, committing or restoring the pre-edit text.
    fn finish_edit(&mut self, commit: bool) {
        let Some(cell) = self.session.selection.end_edit() else {
            return;
        };
        let origin = self.edit_origin.take();
        self.grid.set_editable(cell, false);
        if commit {
            let text = self.grid.text(cell).unwrap_or_default();
            self.commit(cell, &text);
        } else if let Some(origin) = origin {
            self.grid.set_text(cell, &origin);
        }
        self.grid.release_focus(cell);
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    pub fn key_down(&mut self, input: &KeyInput) -> KeyOutcome {
        if input.in_text_field {
            // Editing keys and the clipboard belong to that field.
            return match input.shortcut() {
                Some(shortcut @ (Shortcut::Save | Shortcut::Compile)) => self.run_shortcut(shortcut),
                _ => KeyOutcome::Ignored,
            };
        }
        if input.command {
            return match input.shortcut() {
                Some(shortcut) => self.run_shortcut(shortcut),
                None => KeyOutcome::Ignored,
            };
        }

        let selection = &self.session.selection;
        if selection.is_empty() {
            return KeyOutcome::Ignored;
        }
        let editing = selection.is_editing();

        match input.key {
            Key::Enter => {
                if editing {
                    self.finish_edit(true);
                } else {
                    self.begin_edit();
                }
                KeyOutcome::Handled
            }
            Key::Escape => {
                if editing {
                    self.finish_edit(false);
                } else {
                    self.update_selection(|s| {
                        s.clear();
                    });
                }
                KeyOutcome::Handled
            }
            Key::Arrow(axis, delta) => self.navigate(axis, delta, input.shift),
            Key::Tab => self.navigate(Axis::Col, if input.shift { -1 } else { 1 }, false),
            Key::Delete if !editing => {
                self.delete_selection();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Arrow/Tab movement. A target without a backing cell leaves the
    /// selection as it was.
    fn navigate(&mut self, axis: Axis, delta: i64, extend: bool) -> KeyOutcome {
        let selection = &self.session.selection;
        if selection.is_editing() {
            return KeyOutcome::Ignored;
        }
        let Some(target) = selection.focus_target(axis, delta) else {
            return KeyOutcome::Ignored;
        };
        if self.grid.has_cell(target) {
            self.update_selection(|s| {
                s.move_focus_along_axis(axis, delta, extend);
            });
        } else {
            log::debug!("no cell at {target}, selection unchanged");
        }
        KeyOutcome::Handled
    }

    fn run_shortcut(&mut self, shortcut: Shortcut) -> KeyOutcome {
        match shortcut {
            Shortcut::Save => {
                if let Err(err) = self
                    .engine
                    .current()
                    .and_then(|engine| engine.save_app_state())
                {
                    log::warn!("save failed: {err}");
                }
                KeyOutcome::Handled
            }
            Shortcut::Compile => KeyOutcome::Compile,
            Shortcut::Copy | Shortcut::Cut | Shortcut::Paste => {
                // While editing, clipboard keys belong to the text field.
                if self.session.selection.is_editing() {
                    return KeyOutcome::Ignored;
                }
                let Some(rect) = self.session.selection.current_rectangle() else {
                    return KeyOutcome::Ignored;
                };
                match shortcut {
                    Shortcut::Copy => self.session.clipboard.begin_copy(rect),
                    Shortcut::Cut => self.session.clipboard.begin_cut(rect),
                    _ => self.paste(rect.origin()),
                }
                KeyOutcome::Handled
            }
        }
    }

    /// Replay the pending transfer with its top-left corner at `anchor`.
    fn paste(&mut self, anchor: CellAddress) {
        let Some(plan) = self.session.clipboard.paste_plan(anchor) else {
            return;
        };
        if let Some(&(_, missing)) = plan.pairs.iter().find(|&&(_, t)| !self.grid.has_cell(t)) {
            log::debug!("paste target {missing} has no cell, paste rejected");
            return;
        }
        let engine = match self.engine.current() {
            Ok(engine) => engine,
            Err(err) => {
                log::warn!("cannot paste: {err}");
                return;
            }
        };

        let mut shown = Vec::new();
        let mut cleared = Vec::new();
        let result = self.session.clipboard.apply_paste(
            anchor,
            |source, target| engine.copy_cell_get_raw_value(source, target),
            |target, raw: String| {
                if let Some(display) = store(&engine, target, &raw) {
                    shown.push((target, display));
                }
            },
            |source| {
                if let Some(display) = store(&engine, source, "") {
                    cleared.push((source, display));
                }
            },
        );

        match result {
            Ok(Some(report)) => log::debug!(
                "pasted {} cells ({:?}) into {}..{}",
                report.written,
                report.mode,
                report.target.origin(),
                CellAddress::new(report.target.max_col, report.target.max_row)
            ),
            Ok(None) => {}
            Err(err) => log::error!("paste aborted: {err}"),
        }
        for (cell, display) in shown.into_iter().chain(cleared) {
            self.grid.set_text(cell, &display);
        }
    }

    /// Clear every cell of the selection through the engine.
    fn delete_selection(&mut self) {
        let Some(rect) = self.session.selection.current_rectangle() else {
            return;
        };
        let engine = match self.engine.current() {
            Ok(engine) => engine,
            Err(err) => {
                log::warn!("cannot delete: {err}");
                return;
            }
        };
        for cell in rect.cells() {
            if !self.grid.has_cell(cell) {
                continue;
            }
            if let Some(display) = store(&engine, cell, "") {
                self.grid.set_text(cell, &display);
            }
        }
    }

    /// Drop the selection, as Escape does outside editing.
    pub fn clear_selection(&mut self) {
        self.finish_edit(true);
        self.dragging = false;
        self.update_selection(|s| {
            s.clear();
        });
    }
}
