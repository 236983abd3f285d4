//! Copy/cut/paste with a relative offset.
//!
//! The clipboard remembers one pending transfer for the whole session. A
//! paste replays the source rectangle onto a new top-left anchor: every
//! source cell `(c, r)` lands on `(c + dc, r + dr)`, where `(dc, dr)` is the
//! distance from the source's top-left corner to the anchor.
//!
//! Source and target may overlap, so every source value is read before the
//! first write lands.

use crate::cell_ref::{CellAddress, CellRange};
use crate::types::{PendingTransfer, TransferMode};

/// Source/target pairs of one paste, in column-major source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePlan {
    pub transfer: PendingTransfer,
    pub target: CellRange,
    pub pairs: Vec<(CellAddress, CellAddress)>,
}

/// What a completed paste did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteReport {
    pub mode: TransferMode,
    pub target: CellRange,
    pub written: usize,
    pub cleared: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    pending: Option<PendingTransfer>,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> Option<PendingTransfer> {
        self.pending
    }

    pub fn begin_copy(&mut self, source: CellRange) {
        self.pending = Some(PendingTransfer {
            source,
            mode: TransferMode::Copy,
        });
    }

    pub fn begin_cut(&mut self, source: CellRange) {
        self.pending = Some(PendingTransfer {
            source,
            mode: TransferMode::Cut,
        });
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Compute where each source cell lands for a paste at `target_anchor`.
    #[must_use]
    pub fn paste_plan(&self, target_anchor: CellAddress) -> Option<PastePlan> {
        let transfer = self.pending?;
        let source = transfer.source;
        let col_distance = target_anchor.col.saturating_sub(source.min_col);
        let row_distance = target_anchor.row.saturating_sub(source.min_row);

        let target = CellRange::from_corners(
            source.origin().translate(col_distance, row_distance),
            CellAddress::new(source.max_col, source.max_row).translate(col_distance, row_distance),
        );
        let pairs = source
            .cells()
            .map(|cell| (cell, cell.translate(col_distance, row_distance)))
            .collect();

        Some(PastePlan {
            transfer,
            target,
            pairs,
        })
    }

    /// Replay the pending transfer onto `target_anchor`.
    ///
    /// `read(source, target)` is called for every pair before any
    /// `write(target, value)`. For a cut, source cells outside the target
    /// rectangle are then passed to `clear` and the transfer is dropped; a
    /// copy stays pending. Returns `Ok(None)` when nothing is pending.
    ///
    /// # Errors
    /// The first `read` error aborts the paste before anything is written.
    pub fn apply_paste<V, E, R, W, C>(
        &mut self,
        target_anchor: CellAddress,
        mut read: R,
        mut write: W,
        mut clear: C,
    ) -> Result<Option<PasteReport>, E>
    where
        R: FnMut(CellAddress, CellAddress) -> Result<V, E>,
        W: FnMut(CellAddress, V),
        C: FnMut(CellAddress),
    {
        let Some(plan) = self.paste_plan(target_anchor) else {
            return Ok(None);
        };

        let snapshot = plan
            .pairs
            .iter()
            .map(|&(source, target)| read(source, target).map(|value| (target, value)))
            .collect::<Result<Vec<_>, E>>()?;

        let written = snapshot.len();
        for (target, value) in snapshot {
            write(target, value);
        }

        let mut cleared = 0;
        if plan.transfer.mode == TransferMode::Cut {
            for source in plan.transfer.source.cells() {
                if !plan.target.contains(source) {
                    clear(source);
                    cleared += 1;
                }
            }
            self.pending = None;
        }

        Ok(Some(PasteReport {
            mode: plan.transfer.mode,
            target: plan.target,
            written,
            cleared,
        }))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;

    fn at(col: i64, row: i64) -> CellAddress {
        CellAddress::new(col, row)
    }

    fn range(a: (i64, i64), b: (i64, i64)) -> CellRange {
        CellRange::from_corners(at(a.0, a.1), at(b.0, b.1))
    }

    /// Sheet of raw values keyed by address.
    fn sheet(cells: &[((i64, i64), &str)]) -> HashMap<CellAddress, String> {
        cells
            .iter()
            .map(|&((c, r), v)| (at(c, r), v.to_string()))
            .collect()
    }

    fn paste(
        clipboard: &mut Clipboard,
        data: &mut HashMap<CellAddress, String>,
        anchor: CellAddress,
    ) -> Option<PasteReport> {
        let reads = data.clone();
        let mut writes = Vec::new();
        let mut clears = Vec::new();
        let report = clipboard
            .apply_paste(
                anchor,
                |source, _| Ok::<_, Infallible>(reads.get(&source).cloned().unwrap_or_default()),
                |target, value| writes.push((target, value)),
                |source| clears.push(source),
            )
            .unwrap();
        for (target, value) in writes {
            data.insert(target, value);
        }
        for source in clears {
            data.remove(&source);
        }
        report
    }

    #[test]
    fn test_paste_without_transfer_is_noop() {
        let mut clipboard = Clipboard::new();
        let mut data = sheet(&[((0, 0), "a")]);
        assert_eq!(paste(&mut clipboard, &mut data, at(3, 3)), None);
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_plan_translates_by_anchor_distance() {
        let mut clipboard = Clipboard::new();
        clipboard.begin_copy(range((1, 1), (2, 3)));
        let plan = clipboard.paste_plan(at(5, 0)).unwrap();
        assert_eq!(plan.target, range((5, 0), (6, 2)));
        assert_eq!(
            plan.pairs,
            vec![
                (at(1, 1), at(5, 0)),
                (at(1, 2), at(5, 1)),
                (at(1, 3), at(5, 2)),
                (at(2, 1), at(6, 0)),
                (at(2, 2), at(6, 1)),
                (at(2, 3), at(6, 2)),
            ]
        );
    }

    #[test]
    fn test_copy_stays_pending() {
        let mut clipboard = Clipboard::new();
        let mut data = sheet(&[((0, 0), "1"), ((0, 1), "2")]);
        clipboard.begin_copy(range((0, 0), (0, 1)));

        let report = paste(&mut clipboard, &mut data, at(2, 0)).unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(report.cleared, 0);
        assert!(clipboard.pending().is_some());

        paste(&mut clipboard, &mut data, at(4, 4));
        assert_eq!(data[&at(2, 0)], "1");
        assert_eq!(data[&at(4, 5)], "2");
        assert_eq!(data[&at(0, 0)], "1");
        assert_eq!(clipboard.pending().unwrap().mode, TransferMode::Copy);
    }

    #[test]
    fn test_cut_clears_source_once() {
        let mut clipboard = Clipboard::new();
        let mut data = sheet(&[((0, 0), "x"), ((1, 0), "y")]);
        clipboard.begin_cut(range((0, 0), (1, 0)));

        let report = paste(&mut clipboard, &mut data, at(0, 3)).unwrap();
        assert_eq!(report.mode, TransferMode::Cut);
        assert_eq!(report.cleared, 2);
        assert_eq!(data.get(&at(0, 0)), None);
        assert_eq!(data.get(&at(1, 0)), None);
        assert_eq!(data[&at(0, 3)], "x");
        assert_eq!(data[&at(1, 3)], "y");
        assert_eq!(clipboard.pending(), None);

        assert_eq!(paste(&mut clipboard, &mut data, at(5, 5)), None);
    }

    #[test]
    fn test_overlapping_paste_uses_original_values() {
        let mut clipboard = Clipboard::new();
        let mut data = sheet(&[((0, 0), "a"), ((0, 1), "b"), ((0, 2), "c")]);
        clipboard.begin_copy(range((0, 0), (0, 2)));

        // Shift the column down by one: targets overlap sources 1 and 2.
        paste(&mut clipboard, &mut data, at(0, 1));
        assert_eq!(data[&at(0, 0)], "a");
        assert_eq!(data[&at(0, 1)], "a");
        assert_eq!(data[&at(0, 2)], "b");
        assert_eq!(data[&at(0, 3)], "c");
    }

    #[test]
    fn test_overlapping_cut_keeps_pasted_cells() {
        let mut clipboard = Clipboard::new();
        let mut data = sheet(&[((0, 0), "a"), ((1, 0), "b")]);
        clipboard.begin_cut(range((0, 0), (1, 0)));

        let report = paste(&mut clipboard, &mut data, at(1, 0)).unwrap();
        assert_eq!(report.cleared, 1);
        assert_eq!(data.get(&at(0, 0)), None);
        assert_eq!(data[&at(1, 0)], "a");
        assert_eq!(data[&at(2, 0)], "b");
    }

    #[test]
    fn test_read_error_writes_nothing() {
        let mut clipboard = Clipboard::new();
        clipboard.begin_cut(range((0, 0), (0, 1)));
        let mut writes = 0;
        let mut clears = 0;
        let result = clipboard.apply_paste(
            at(3, 3),
            |source, _| if source.row == 1 { Err("engine gone") } else { Ok(()) },
            |_, ()| writes += 1,
            |_| clears += 1,
        );
        assert_eq!(result, Err("engine gone"));
        assert_eq!((writes, clears), (0, 0));
        assert!(clipboard.pending().is_some());
    }

    #[test]
    fn test_new_transfer_replaces_pending() {
        let mut clipboard = Clipboard::new();
        clipboard.begin_copy(range((0, 0), (0, 0)));
        clipboard.begin_cut(range((2, 2), (3, 3)));
        let pending = clipboard.pending().unwrap();
        assert_eq!(pending.mode, TransferMode::Cut);
        assert_eq!(pending.source, range((2, 2), (3, 3)));
        clipboard.reset();
        assert_eq!(clipboard.pending(), None);
    }
}
