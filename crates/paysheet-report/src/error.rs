use thiserror::Error;

use crate::MonthParseError;

/// Structural errors in a report run.
///
/// Data-quality problems are deliberately absent here: they are coerced and
/// flagged in the output instead of failing the run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("source workbook has no sheet named '{0}'")]
    MissingSheet(String),
    #[error("sheet '{sheet}' needs at least {expected} columns, header row has {found}")]
    MissingColumns {
        sheet: String,
        expected: usize,
        found: usize,
    },
    #[error("employee roster is empty; nothing to generate")]
    NoEmployees,
    #[error(transparent)]
    InvalidMonth(#[from] MonthParseError),
}
