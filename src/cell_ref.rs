//! Utilities for parsing `"<column>-<row>"` cell addresses and walking ranges.
//!
//! The address string doubles as the DOM element id of a rendered cell, so
//! every address produced here can be looked up directly in the document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SheeetError};

/// A cell position as `(column, row)`.
///
/// Coordinates are plain integers; grid bounds are not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub col: i64,
    pub row: i64,
}

/// Axis along which an address is offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// Normalized bounds of a closed rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub min_col: i64,
    pub max_col: i64,
    pub min_row: i64,
    pub max_row: i64,
}

impl CellAddress {
    #[must_use]
    pub const fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }

    /// The address shifted by `delta` along `axis`.
    ///
    /// Saturates at `i64::MIN`/`i64::MAX` instead of wrapping, so the result
    /// is only the exact offset when it stays within `i64`.
    #[must_use]
    pub fn offset(self, axis: Axis, delta: i64) -> Self {
        match axis {
            Axis::Row => Self::new(self.col, self.row.saturating_add(delta)),
            Axis::Col => Self::new(self.col.saturating_add(delta), self.row),
        }
    }

    /// The address shifted by a column and a row distance. Saturates at the
    /// `i64` bounds like [`CellAddress::offset`].
    #[must_use]
    pub fn translate(self, col_distance: i64, row_distance: i64) -> Self {
        Self::new(
            self.col.saturating_add(col_distance),
            self.row.saturating_add(row_distance),
        )
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.col, self.row)
    }
}

impl FromStr for CellAddress {
    type Err = SheeetError;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s)
    }
}

impl Serialize for CellAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_address(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse one integer component in canonical form (no `+`, no leading zeros, no `-0`).
fn parse_component(part: &str) -> Option<i64> {
    let digits = part.strip_prefix('-').unwrap_or(part);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = part.parse().ok()?;
    (value.to_string() == part).then_some(value)
}

/// Parse an address like `"3-12"` (or `"-1-0"`) into a [`CellAddress`].
///
/// # Errors
/// Returns [`SheeetError::Format`] unless the string is exactly `<int>-<int>`.
pub fn parse_address(id: &str) -> Result<CellAddress> {
    let malformed = || SheeetError::Format(id.to_string());

    // The first character may be the column's sign, so the separator search
    // starts after it.
    let mut chars = id.char_indices();
    chars.next().ok_or_else(malformed)?;
    let (split, _) = chars.find(|&(_, c)| c == '-').ok_or_else(malformed)?;

    let col = id.get(..split).and_then(parse_component);
    let row = id.get(split + 1..).and_then(parse_component);
    match (col, row) {
        (Some(col), Some(row)) => Ok(CellAddress::new(col, row)),
        _ => Err(malformed()),
    }
}

/// Format `(col, row)` as its `"<column>-<row>"` address.
#[must_use]
pub fn format_address(col: i64, row: i64) -> String {
    CellAddress::new(col, row).to_string()
}

/// Shift an address string along one axis.
///
/// # Errors
/// Returns [`SheeetError::Format`] if `id` is not a valid address.
pub fn offset_address(id: &str, axis: Axis, delta: i64) -> Result<String> {
    Ok(parse_address(id)?.offset(axis, delta).to_string())
}

impl CellRange {
    /// Normalize two opposite corners into bounds.
    #[must_use]
    pub fn from_corners(a: CellAddress, b: CellAddress) -> Self {
        Self {
            min_col: a.col.min(b.col),
            max_col: a.col.max(b.col),
            min_row: a.row.min(b.row),
            max_row: a.row.max(b.row),
        }
    }

    #[must_use]
    pub fn single(cell: CellAddress) -> Self {
        Self::from_corners(cell, cell)
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> CellAddress {
        CellAddress::new(self.min_col, self.min_row)
    }

    #[must_use]
    pub fn contains(&self, cell: CellAddress) -> bool {
        (self.min_col..=self.max_col).contains(&cell.col)
            && (self.min_row..=self.max_row).contains(&cell.row)
    }

    /// Column count, saturating at `u64::MAX` for a range spanning every
    /// `i64` column.
    #[must_use]
    pub fn width(&self) -> u64 {
        self.max_col.abs_diff(self.min_col).saturating_add(1)
    }

    /// Row count, saturating like [`CellRange::width`].
    #[must_use]
    pub fn height(&self) -> u64 {
        self.max_row.abs_diff(self.min_row).saturating_add(1)
    }

    /// Number of cells in the rectangle.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.width().saturating_mul(self.height())
    }

    /// Always false; a range holds at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every cell in column-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> {
        let rows = self.min_row..=self.max_row;
        (self.min_col..=self.max_col)
            .flat_map(move |col| rows.clone().map(move |row| CellAddress::new(col, row)))
    }
}

/// Visit every point of the rectangle spanned by two corners.
///
/// Columns ascend in the outer loop and rows in the inner loop; paste and cut
/// depend on this order visiting each cell exactly once.
pub fn enumerate_rectangle<F>(corner1: CellAddress, corner2: CellAddress, mut visit: F)
where
    F: FnMut(i64, i64, &CellRange),
{
    let bounds = CellRange::from_corners(corner1, corner2);
    for cell in bounds.cells() {
        visit(cell.col, cell.row, &bounds);
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
    use test_case::test_case;

    #[test_case("0-0", 0, 0)]
    #[test_case("3-12", 3, 12)]
    #[test_case("-1-0", -1, 0)]
    #[test_case("4--7", 4, -7)]
    #[test_case("-2--3", -2, -3)]
    fn test_parse_address(id: &str, col: i64, row: i64) {
        assert_eq!(parse_address(id).unwrap(), CellAddress::new(col, row));
    }

    #[test_case(""; "empty")]
    #[test_case("-"; "lone dash")]
    #[test_case("1"; "missing row")]
    #[test_case("1-"; "empty row")]
    #[test_case("-1"; "signed column only")]
    #[test_case("a-1"; "letters")]
    #[test_case("A1"; "excel style")]
    #[test_case("1-2-3"; "three parts")]
    #[test_case(" 1-2"; "leading space")]
    #[test_case("+1-2"; "plus sign")]
    #[test_case("01-2"; "leading zero")]
    #[test_case("-0-2"; "negative zero")]
    #[test_case("99999999999999999999-1"; "overflow")]
    fn test_parse_rejects(id: &str) {
        assert!(matches!(parse_address(id), Err(SheeetError::Format(_))));
    }

    #[test]
    fn test_format_parse_roundtrip() {
        for col in [-1_000_000_i64, -3, -1, 0, 1, 26, i64::MAX, i64::MIN] {
            for row in [i64::MIN, -65, 0, 7, 65, i64::MAX] {
                let id = format_address(col, row);
                assert_eq!(parse_address(&id).unwrap(), CellAddress::new(col, row));
            }
        }
    }

    #[test]
    fn test_offset_address() {
        assert_eq!(offset_address("1-1", Axis::Row, 1).unwrap(), "1-2");
        assert_eq!(offset_address("1-1", Axis::Col, -1).unwrap(), "0-1");
        assert_eq!(offset_address("0-0", Axis::Row, -1).unwrap(), "0--1");
        assert!(offset_address("x", Axis::Row, 1).is_err());
    }

    #[test]
    fn test_enumerate_column_major() {
        let mut visited = Vec::new();
        enumerate_rectangle(CellAddress::new(1, 5), CellAddress::new(2, 6), |c, r, _| {
            visited.push((c, r));
        });
        assert_eq!(visited, vec![(1, 5), (1, 6), (2, 5), (2, 6)]);
    }

    #[test]
    fn test_enumerate_corner_order_independent() {
        let corners = [
            (CellAddress::new(4, 1), CellAddress::new(2, 3)),
            (CellAddress::new(2, 3), CellAddress::new(4, 1)),
            (CellAddress::new(2, 1), CellAddress::new(4, 3)),
            (CellAddress::new(4, 3), CellAddress::new(2, 1)),
        ];
        let mut runs = Vec::new();
        for (a, b) in corners {
            let mut visited = Vec::new();
            enumerate_rectangle(a, b, |c, r, bounds| {
                assert_eq!(bounds.min_col, 2);
                assert_eq!(bounds.max_row, 3);
                visited.push((c, r));
            });
            runs.push(visited);
        }
        assert_eq!(runs[0].len(), 9);
        assert!(runs.iter().all(|run| *run == runs[0]));
    }

    #[test]
    fn test_range_queries() {
        let range = CellRange::from_corners(CellAddress::new(3, 3), CellAddress::new(1, 2));
        assert_eq!(range.origin(), CellAddress::new(1, 2));
        assert_eq!(range.width(), 3);
        assert_eq!(range.height(), 2);
        assert_eq!(range.len(), 6);
        assert!(range.contains(CellAddress::new(2, 3)));
        assert!(!range.contains(CellAddress::new(0, 3)));
        assert_eq!(CellRange::single(CellAddress::new(7, 7)).len(), 1);
    }

    #[test]
    fn test_full_span_range_saturates() {
        let range = CellRange::from_corners(
            CellAddress::new(i64::MIN, i64::MIN),
            CellAddress::new(i64::MAX, 0),
        );
        assert_eq!(range.width(), u64::MAX);
        assert_eq!(range.height(), i64::MIN.unsigned_abs() + 1);
        assert_eq!(range.len(), u64::MAX);
    }

    #[test]
    fn test_offset_saturates_at_bounds() {
        let edge = CellAddress::new(i64::MAX, i64::MIN);
        assert_eq!(edge.offset(Axis::Col, 1), edge);
        assert_eq!(edge.offset(Axis::Row, -1), edge);
        assert_eq!(edge.translate(1, -1), edge);
        assert_eq!(edge.translate(-1, 1), CellAddress::new(i64::MAX - 1, i64::MIN + 1));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CellAddress::new(2, -1)).unwrap();
        assert_eq!(json, "\"2--1\"");
        let back: CellAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CellAddress::new(2, -1));
        assert!(serde_json::from_str::<CellAddress>("\"B2\"").is_err());
    }
}
