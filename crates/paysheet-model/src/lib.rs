//! `paysheet-model` defines the in-memory spreadsheet structures the report
//! generator builds before serialization.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the ledger layout engine (`paysheet-report`)
//! - the `.xlsx` import/export layer (`paysheet-xlsx`)
//! without either depending on the other.

mod address;
mod cell;
mod print;
mod sheet_name;
mod style;
mod value;
mod workbook;
mod worksheet;

pub use address::{column_name, A1ParseError, CellRef, Range};
pub use cell::{Cell, EXCEL_MAX_COLS, EXCEL_MAX_ROWS};
pub use print::{Orientation, PageMargins, PageSetup, PaperSize};
pub use sheet_name::{
    sanitize_sheet_name, validate_sheet_name, SheetNameError, EXCEL_MAX_SHEET_NAME_LEN,
    SHEET_NAME_ILLEGAL_CHARS,
};
pub use style::{
    Alignment, Border, BorderStyle, Color, Fill, Font, HorizontalAlignment, Style, StyleTable,
    VerticalAlignment,
};
pub use value::CellValue;
pub use workbook::{AddSheetError, Workbook};
pub use worksheet::{MergeOverlap, Worksheet, WorksheetId};
