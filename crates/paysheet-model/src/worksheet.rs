use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Cell, CellRef, CellValue, PageSetup, Range};

/// Identifier for a worksheet within a workbook.
pub type WorksheetId = u32;

/// A single worksheet: sparse cell grid plus presentation metadata.
///
/// Cells are keyed by [`CellRef`], whose `Ord` is row-major, so iteration
/// yields cells in the order worksheet XML wants them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Worksheet {
    pub id: WorksheetId,
    pub name: String,

    #[serde(default)]
    cells: BTreeMap<CellRef, Cell>,

    /// Explicit column widths (spreadsheet width units), keyed by 0-indexed
    /// column.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub col_widths: BTreeMap<u32, f64>,

    /// Explicit row heights in points, keyed by 0-indexed row.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub row_heights: BTreeMap<u32, f64>,

    /// Merged regions, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merges: Vec<Range>,

    #[serde(default, skip_serializing_if = "PageSetup::is_default")]
    pub page_setup: PageSetup,
}

/// Error raised when adding a merged region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("merge range {new} overlaps existing merge {existing}")]
pub struct MergeOverlap {
    pub new: Range,
    pub existing: Range,
}

impl Worksheet {
    /// Create a new empty worksheet.
    pub fn new(id: WorksheetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cells: BTreeMap::new(),
            col_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            merges: Vec::new(),
            page_setup: PageSetup::default(),
        }
    }

    /// Set a cell's value, preserving any existing formula and style.
    pub fn set_value(&mut self, at: CellRef, value: impl Into<CellValue>) {
        self.cells.entry(at).or_default().value = value.into();
        self.prune(at);
    }

    /// Set a cell's formula, preserving any existing value and style.
    pub fn set_formula(&mut self, at: CellRef, formula: impl Into<String>) {
        let cell = Cell::with_formula(formula);
        self.cells.entry(at).or_default().formula = cell.formula;
    }

    /// Set a cell's style id, creating the cell if needed.
    pub fn set_style(&mut self, at: CellRef, style_id: u32) {
        self.cells.entry(at).or_default().style_id = style_id;
        self.prune(at);
    }

    /// Replace a cell wholesale.
    pub fn set_cell(&mut self, at: CellRef, cell: Cell) {
        if cell.is_truly_empty() {
            self.cells.remove(&at);
        } else {
            self.cells.insert(at, cell);
        }
    }

    /// Get a cell, if present.
    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(&at)
    }

    /// A cell's value ([`CellValue::Empty`] when the cell is absent).
    pub fn value(&self, at: CellRef) -> CellValue {
        self.cells
            .get(&at)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// A cell's style id (0 when the cell is absent).
    pub fn style_id(&self, at: CellRef) -> u32 {
        self.cells.get(&at).map(|c| c.style_id).unwrap_or(0)
    }

    /// Iterate stored cells in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> {
        self.cells.iter().map(|(r, c)| (*r, c))
    }

    /// Number of stored (non-empty) cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Add a merged region. Overlapping merges are invalid in the file format
    /// and rejected here rather than at serialization time.
    pub fn merge(&mut self, range: Range) -> Result<(), MergeOverlap> {
        for existing in &self.merges {
            if ranges_overlap(*existing, range) {
                return Err(MergeOverlap {
                    new: range,
                    existing: *existing,
                });
            }
        }
        self.merges.push(range);
        Ok(())
    }

    pub fn set_col_width(&mut self, col: u32, width: f64) {
        self.col_widths.insert(col, width);
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    /// Bounding box of all stored cells.
    pub fn used_range(&self) -> Option<Range> {
        let mut iter = self.cells.keys();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for r in iter {
            min.row = min.row.min(r.row);
            min.col = min.col.min(r.col);
            max.row = max.row.max(r.row);
            max.col = max.col.max(r.col);
        }
        Some(Range::new(min, max))
    }

    /// The last row (0-indexed) holding a stored cell in `col`, if any.
    ///
    /// Cells that exist purely for styling still count: the ledger's summary
    /// row goes below every rendered row, styled or not.
    pub fn last_row_in_col(&self, col: u32) -> Option<u32> {
        self.cells
            .keys()
            .filter(|r| r.col == col)
            .map(|r| r.row)
            .max()
    }

    fn prune(&mut self, at: CellRef) {
        if self.cells.get(&at).is_some_and(Cell::is_truly_empty) {
            self.cells.remove(&at);
        }
    }
}

fn ranges_overlap(a: Range, b: Range) -> bool {
    a.start.row <= b.end.row
        && b.start.row <= a.end.row
        && a.start.col <= b.end.col
        && b.start.col <= a.end.col
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cells_iterate_row_major() {
        let mut ws = Worksheet::new(1, "test");
        ws.set_value(CellRef::new(1, 0), "b");
        ws.set_value(CellRef::new(0, 4), "a2");
        ws.set_value(CellRef::new(0, 0), "a1");
        let order: Vec<String> = ws.iter_cells().map(|(r, _)| r.to_a1()).collect();
        assert_eq!(order, ["A1", "E1", "A2"]);
    }

    #[test]
    fn empty_value_prunes_unstyled_cell() {
        let mut ws = Worksheet::new(1, "test");
        let at = CellRef::new(3, 3);
        ws.set_value(at, "x");
        assert_eq!(ws.cell_count(), 1);
        ws.set_value(at, CellValue::Empty);
        assert_eq!(ws.cell_count(), 0);

        // A styled cell survives with an empty value.
        ws.set_style(at, 2);
        ws.set_value(at, CellValue::Empty);
        assert_eq!(ws.cell_count(), 1);
    }

    #[test]
    fn overlapping_merges_are_rejected() {
        let mut ws = Worksheet::new(1, "test");
        ws.merge(Range::new(CellRef::new(0, 0), CellRef::new(0, 10)))
            .unwrap();
        let clash = ws.merge(Range::new(CellRef::new(0, 5), CellRef::new(1, 6)));
        assert!(clash.is_err());
        let below = ws.merge(Range::new(CellRef::new(1, 0), CellRef::new(1, 4)));
        assert!(below.is_ok());
    }

    #[test]
    fn last_row_tracks_styled_cells() {
        let mut ws = Worksheet::new(1, "test");
        assert_eq!(ws.last_row_in_col(0), None);
        ws.set_value(CellRef::new(3, 0), "x");
        ws.set_style(CellRef::new(7, 0), 1);
        ws.set_value(CellRef::new(5, 1), "y");
        assert_eq!(ws.last_row_in_col(0), Some(7));
        assert_eq!(ws.last_row_in_col(1), Some(5));
    }
}
