use crate::cell_ref::{Axis, CellAddress, CellRange};

/// Anchor/focus selection over the grid.
///
/// Anchor and focus are either both unset or both set. The anchor is the
/// fixed corner; the focus moves while a range is extended. The editable
/// flag, when set, belongs to the anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    anchor: Option<CellAddress>,
    focus: Option<CellAddress>,
    editing: bool,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn anchor(&self) -> Option<CellAddress> {
        self.anchor
    }

    #[must_use]
    pub fn focus(&self) -> Option<CellAddress> {
        self.focus
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none()
    }

    /// Whether the anchor cell is in text-entry mode.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Collapse the selection to one cell.
    ///
    /// Editing ends if the anchor moves to a different cell.
    pub fn select_single(&mut self, cell: CellAddress) {
        if self.anchor != Some(cell) {
            self.editing = false;
        }
        self.anchor = Some(cell);
        self.focus = Some(cell);
    }

    /// Move the focus corner, keeping the anchor.
    ///
    /// Without an anchor this behaves like [`Selection::select_single`].
    pub fn extend_to(&mut self, cell: CellAddress) {
        if self.anchor.is_none() {
            self.select_single(cell);
            return;
        }
        self.focus = Some(cell);
    }

    /// Drop the selection, returning the rectangle that was selected so the
    /// caller can remove its decoration.
    pub fn clear(&mut self) -> Option<CellRange> {
        let previous = self.current_rectangle();
        self.anchor = None;
        self.focus = None;
        self.editing = false;
        previous
    }

    #[must_use]
    pub fn current_rectangle(&self) -> Option<CellRange> {
        let anchor = self.anchor?;
        Some(CellRange::from_corners(anchor, self.focus.unwrap_or(anchor)))
    }

    /// Address that [`Selection::move_focus_along_axis`] would move to.
    #[must_use]
    pub fn focus_target(&self, axis: Axis, delta: i64) -> Option<CellAddress> {
        self.focus.or(self.anchor).map(|from| from.offset(axis, delta))
    }

    /// Offset the focus (or anchor) and either extend to or select the result.
    ///
    /// Returns the new address, or `None` when nothing is selected.
    pub fn move_focus_along_axis(
        &mut self,
        axis: Axis,
        delta: i64,
        extend: bool,
    ) -> Option<CellAddress> {
        let target = self.focus_target(axis, delta)?;
        if extend {
            self.extend_to(target);
        } else {
            self.select_single(target);
        }
        Some(target)
    }

    /// Put the anchor into text-entry mode. No-op without a selection.
    pub fn begin_edit(&mut self) -> Option<CellAddress> {
        let anchor = self.anchor?;
        self.editing = true;
        Some(anchor)
    }

    /// Leave text-entry mode, returning the cell that was being edited.
    pub fn end_edit(&mut self) -> Option<CellAddress> {
        if !self.editing {
            return None;
        }
        self.editing = false;
        self.anchor
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn at(col: i64, row: i64) -> CellAddress {
        CellAddress::new(col, row)
    }

    #[test]
    fn test_starts_empty() {
        let selection = Selection::new();
        assert!(selection.is_empty());
        assert_eq!(selection.current_rectangle(), None);
        assert_eq!(selection.focus_target(Axis::Row, 1), None);
    }

    #[test]
    fn test_select_single_collapses_range() {
        let mut selection = Selection::new();
        selection.select_single(at(1, 1));
        selection.extend_to(at(3, 3));
        assert_eq!(selection.current_rectangle().unwrap().len(), 9);

        selection.select_single(at(5, 5));
        let rect = selection.current_rectangle().unwrap();
        assert_eq!(rect.len(), 1);
        assert_eq!(rect.origin(), at(5, 5));
    }

    #[test]
    fn test_extend_from_anchor() {
        let mut selection = Selection::new();
        selection.select_single(at(2, 2));
        selection.extend_to(at(4, 4));
        let cells: Vec<_> = selection.current_rectangle().unwrap().cells().collect();
        let mut expected = Vec::new();
        for col in 2..=4 {
            for row in 2..=4 {
                expected.push(at(col, row));
            }
        }
        assert_eq!(cells, expected);
        assert_eq!(selection.anchor(), Some(at(2, 2)));
        assert_eq!(selection.focus(), Some(at(4, 4)));
    }

    #[test]
    fn test_extend_without_anchor_selects() {
        let mut selection = Selection::new();
        selection.extend_to(at(3, 1));
        assert_eq!(selection.anchor(), Some(at(3, 1)));
        assert_eq!(selection.focus(), Some(at(3, 1)));
    }

    #[test]
    fn test_clear_returns_previous_rectangle() {
        let mut selection = Selection::new();
        selection.select_single(at(0, 0));
        selection.extend_to(at(1, 2));
        let previous = selection.clear().unwrap();
        assert_eq!(previous.len(), 6);
        assert!(selection.is_empty());
        assert_eq!(selection.clear(), None);
    }

    #[test]
    fn test_move_focus() {
        let mut selection = Selection::new();
        assert_eq!(selection.move_focus_along_axis(Axis::Row, 1, false), None);

        selection.select_single(at(1, 1));
        selection.move_focus_along_axis(Axis::Row, 1, false);
        assert_eq!(selection.current_rectangle(), Some(CellRange::single(at(1, 2))));

        selection.move_focus_along_axis(Axis::Col, 1, true);
        let rect = selection.current_rectangle().unwrap();
        assert_eq!(selection.anchor(), Some(at(1, 2)));
        assert_eq!(rect.len(), 2);

        // A plain move starts from the focus, not the anchor.
        selection.move_focus_along_axis(Axis::Row, 1, false);
        assert_eq!(selection.anchor(), Some(at(2, 3)));
    }

    #[test]
    fn test_editing_follows_anchor() {
        let mut selection = Selection::new();
        assert_eq!(selection.begin_edit(), None);

        selection.select_single(at(1, 1));
        assert_eq!(selection.begin_edit(), Some(at(1, 1)));
        selection.select_single(at(1, 1));
        assert!(selection.is_editing());

        selection.select_single(at(2, 1));
        assert!(!selection.is_editing());
        assert_eq!(selection.end_edit(), None);

        selection.begin_edit();
        assert_eq!(selection.end_edit(), Some(at(2, 1)));
        assert!(!selection.is_editing());
    }
}
