use serde::{Deserialize, Serialize};

use crate::CellValue;

/// Excel-compatible maximum rows per worksheet (1,048,576).
pub const EXCEL_MAX_ROWS: u32 = 1_048_576;

/// Excel-compatible maximum columns per worksheet (16,384).
pub const EXCEL_MAX_COLS: u32 = 16_384;

/// A single cell record.
///
/// Cells are stored sparsely: a cell with no value, no formula and the default
/// style is not kept in the worksheet map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Cell {
    /// The cell's literal value. For formula cells this is the cached value,
    /// which the generator leaves [`CellValue::Empty`] so the consuming
    /// application recalculates on open.
    #[serde(default)]
    pub value: CellValue,

    /// Formula text without the leading `=`, if the cell contains a formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Index into the workbook style table.
    #[serde(default)]
    pub style_id: u32,
}

impl Cell {
    /// Create a new cell with the given value.
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Create a formula cell. A leading `=` is stripped so both spellings are
    /// accepted at call sites.
    pub fn with_formula(formula: impl Into<String>) -> Self {
        let formula = formula.into();
        let formula = formula.strip_prefix('=').unwrap_or(&formula).to_string();
        Self {
            formula: Some(formula),
            ..Self::default()
        }
    }

    /// Returns true if this cell has no observable content or formatting.
    ///
    /// Such cells should not be stored in the sparse map.
    pub fn is_truly_empty(&self) -> bool {
        self.value == CellValue::Empty && self.formula.is_none() && self.style_id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_cells_strip_leading_equals() {
        assert_eq!(Cell::with_formula("=C4*D4").formula.as_deref(), Some("C4*D4"));
        assert_eq!(Cell::with_formula("C4*D4").formula.as_deref(), Some("C4*D4"));
    }

    #[test]
    fn empty_cells_are_detected() {
        assert!(Cell::default().is_truly_empty());
        assert!(!Cell::new(0.0).is_truly_empty());
        let styled = Cell {
            style_id: 3,
            ..Cell::default()
        };
        assert!(!styled.is_truly_empty());
    }
}
