use serde::{Deserialize, Serialize};

use crate::{
    sanitize_sheet_name, validate_sheet_name, SheetNameError, Style, StyleTable, Worksheet,
    WorksheetId, EXCEL_MAX_SHEET_NAME_LEN,
};

/// A workbook containing worksheets and the shared style table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workbook {
    /// Worksheets, in tab order.
    #[serde(default)]
    pub sheets: Vec<Worksheet>,

    /// Workbook style table (deduplicated).
    #[serde(default)]
    pub styles: StyleTable,
}

/// Errors raised when adding a worksheet.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddSheetError {
    #[error(transparent)]
    InvalidName(#[from] SheetNameError),
    #[error("sheet name already exists: {0}")]
    DuplicateName(String),
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create a new empty workbook.
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            styles: StyleTable::new(),
        }
    }

    /// Add a worksheet with a validated, unique name, returning its id.
    pub fn add_sheet(&mut self, name: &str) -> Result<WorksheetId, AddSheetError> {
        validate_sheet_name(name)?;
        if self.sheet_by_name(name).is_some() {
            return Err(AddSheetError::DuplicateName(name.to_string()));
        }
        let id = self
            .sheets
            .iter()
            .map(|s| s.id)
            .max()
            .unwrap_or(0)
            .wrapping_add(1);
        self.sheets.push(Worksheet::new(id, name));
        Ok(id)
    }

    /// Add a worksheet named after arbitrary display text.
    ///
    /// The text is sanitized into a legal sheet name; when two inputs collapse
    /// to the same sanitized name a numeric suffix (`-2`, `-3`, ...) is
    /// appended, re-truncating so the result still fits Excel's length limit.
    pub fn add_sheet_for(&mut self, display_name: &str) -> WorksheetId {
        let base = sanitize_sheet_name(display_name);
        let mut candidate = base.clone();
        let mut n = 1u32;
        while self.sheet_by_name(&candidate).is_some() {
            n += 1;
            let suffix = format!("-{n}");
            let keep = EXCEL_MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            candidate = base.chars().take(keep).collect::<String>() + &suffix;
        }
        self.add_sheet(&candidate)
            .expect("sanitized unique name is always valid")
    }

    /// Get a sheet by id.
    pub fn sheet(&self, id: WorksheetId) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    /// Get a mutable sheet by id.
    pub fn sheet_mut(&mut self, id: WorksheetId) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|s| s.id == id)
    }

    /// Find a sheet by name (case-insensitive, like Excel).
    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| sheet_name_eq(&s.name, name))
    }

    /// Intern (deduplicate) a style into the workbook's style table.
    pub fn intern_style(&mut self, style: Style) -> u32 {
        self.styles.intern(style)
    }
}

/// Case-insensitive sheet name comparison.
///
/// Excel compares tab names case-insensitively; simple Unicode lowercasing is
/// close enough for the names this generator produces.
fn sheet_name_eq(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sheet_rejects_duplicates_case_insensitively() {
        let mut wb = Workbook::new();
        wb.add_sheet("March").unwrap();
        assert_eq!(
            wb.add_sheet("march"),
            Err(AddSheetError::DuplicateName("march".to_string()))
        );
    }

    #[test]
    fn display_names_are_sanitized_and_disambiguated() {
        let mut wb = Workbook::new();
        let a = wb.add_sheet_for("A/B");
        let b = wb.add_sheet_for("A\\B");
        assert_eq!(wb.sheet(a).unwrap().name, "A-B");
        assert_eq!(wb.sheet(b).unwrap().name, "A-B-2");
    }

    #[test]
    fn collision_suffix_respects_length_limit() {
        let mut wb = Workbook::new();
        let long = "x".repeat(40);
        wb.add_sheet_for(&long);
        let second = wb.add_sheet_for(&long);
        let name = &wb.sheet(second).unwrap().name;
        assert_eq!(name.chars().count(), EXCEL_MAX_SHEET_NAME_LEN);
        assert!(name.ends_with("-2"));
    }

    #[test]
    fn sheet_ids_are_stable_across_lookup() {
        let mut wb = Workbook::new();
        let id = wb.add_sheet("Ledger").unwrap();
        wb.sheet_mut(id).unwrap().set_value(
            crate::CellRef::new(0, 0),
            "hello",
        );
        assert_eq!(
            wb.sheet_by_name("ledger").unwrap().value(crate::CellRef::new(0, 0)),
            crate::CellValue::String("hello".to_string())
        );
    }
}
