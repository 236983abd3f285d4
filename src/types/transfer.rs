use crate::cell_ref::CellRange;

/// Whether a pending transfer leaves or clears its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    Cut,
}

/// The clipboard's remembered source rectangle, awaiting a paste.
///
/// The rectangle is a snapshot taken at copy/cut time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransfer {
    pub source: CellRange,
    pub mode: TransferMode,
}
