//! [`GridSurface`] over pre-rendered cell elements whose ids are their
//! `"<column>-<row>"` addresses.

use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, EventTarget, HtmlElement, Node, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

use super::{CellMark, GridSurface};
use crate::cell_ref::{parse_address, CellAddress};
use crate::config::ControlsConfig;
use crate::error::{Result, SheeetError};

pub struct DomGrid {
    document: Document,
    root: Element,
    selected_class: String,
    range_class: String,
}

impl DomGrid {
    pub fn new(config: &ControlsConfig) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| SheeetError::Js("no document".into()))?;
        let root = document
            .get_element_by_id(&config.spreadsheet_id)
            .ok_or_else(|| {
                SheeetError::Config(format!("no element with id {:?}", config.spreadsheet_id))
            })?;
        Ok(Self {
            document,
            root,
            selected_class: config.selected_class.clone(),
            range_class: config.range_class.clone(),
        })
    }

    /// The spreadsheet container, where pointer listeners are attached.
    pub fn root(&self) -> &Element {
        &self.root
    }

    fn cell_element(&self, cell: CellAddress) -> Option<HtmlElement> {
        let element = self.document.get_element_by_id(&cell.to_string())?;
        let node: &Node = &element;
        if !self.root.contains(Some(node)) {
            return None;
        }
        element.dyn_into::<HtmlElement>().ok()
    }

    /// Address of the cell an event was dispatched to, if it is one.
    pub fn cell_from_target(target: Option<EventTarget>) -> Option<CellAddress> {
        let element = target?.dyn_into::<Element>().ok()?;
        let id = element.id();
        match parse_address(&id) {
            Ok(cell) => Some(cell),
            Err(err) => {
                log::trace!("event target is not a cell: {err}");
                None
            }
        }
    }

    /// Whether `target` is a text field that is not part of the grid, such
    /// as the source editors. Cells under `root` never count, even while
    /// one is contenteditable.
    pub fn is_text_field_outside(root: &Element, target: Option<EventTarget>) -> bool {
        let Some(element) = target.and_then(|t| t.dyn_into::<HtmlElement>().ok()) else {
            return false;
        };
        let node: &Node = &element;
        if root.contains(Some(node)) {
            return false;
        }
        element.is_content_editable()
            || matches!(element.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
    }
}

impl GridSurface for DomGrid {
    fn has_cell(&self, cell: CellAddress) -> bool {
        self.cell_element(cell).is_some()
    }

    fn text(&self, cell: CellAddress) -> Option<String> {
        Some(self.cell_element(cell)?.text_content().unwrap_or_default())
    }

    fn set_text(&mut self, cell: CellAddress, text: &str) {
        if let Some(element) = self.cell_element(cell) {
            element.set_text_content(Some(text));
        }
    }

    fn set_editable(&mut self, cell: CellAddress, editable: bool) {
        let Some(element) = self.cell_element(cell) else {
            return;
        };
        let result = if editable {
            element.set_attribute("contenteditable", "true")
        } else {
            element.remove_attribute("contenteditable")
        };
        if let Err(err) = result {
            log::warn!("contenteditable on {cell}: {err:?}");
        }
    }

    fn focus(&mut self, cell: CellAddress) {
        if let Some(element) = self.cell_element(cell) {
            if let Err(err) = element.focus() {
                log::warn!("focus on {cell}: {err:?}");
            }
        }
    }

    fn release_focus(&mut self, cell: CellAddress) {
        if let Some(element) = self.cell_element(cell) {
            if let Err(err) = element.blur() {
                log::warn!("blur on {cell}: {err:?}");
            }
        }
    }

    fn set_mark(&mut self, cell: CellAddress, mark: CellMark, on: bool) {
        let Some(element) = self.cell_element(cell) else {
            return;
        };
        let class = match mark {
            CellMark::Anchor => &self.selected_class,
            CellMark::Range => &self.range_class,
        };
        let classes = element.class_list();
        let result = if on {
            classes.add_1(class)
        } else {
            classes.remove_1(class)
        };
        if let Err(err) = result {
            log::warn!("class {class:?} on {cell}: {err:?}");
        }
    }

    fn scroll_into_view(&mut self, cell: CellAddress) {
        if let Some(element) = self.cell_element(cell) {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            options.set_block(ScrollLogicalPosition::Nearest);
            options.set_inline(ScrollLogicalPosition::Nearest);
            element.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }
}
