//! Extraction of the four logical tables from a loaded source workbook.
//!
//! Tables follow the spreadsheet convention of a header row: data starts on
//! the second row. Structural problems (missing sheet, header too narrow) are
//! errors; cell-level junk is passed through for the layout engine to flag.

use paysheet_model::CellValue;
use paysheet_xlsx::{SourceSheet, SourceWorkbook};

use crate::{ReportConfig, ReportError};

/// One production row, as loaded. `date` and `quantity` stay raw so numeric
/// validation can happen (and fail visibly) at layout time.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductionRecord {
    pub employee: String,
    pub date: CellValue,
    pub product: String,
    pub quantity: CellValue,
}

// Production sheet column positions (0-indexed): A is unused in the source
// layout, names start in column B.
const PROD_COL_EMPLOYEE: usize = 1;
const PROD_COL_DATE: usize = 2;
const PROD_COL_PRODUCT: usize = 3;
const PROD_COL_QUANTITY: usize = 4;

fn require_sheet<'a>(
    workbook: &'a SourceWorkbook,
    name: &str,
) -> Result<&'a SourceSheet, ReportError> {
    workbook
        .sheet(name)
        .ok_or_else(|| ReportError::MissingSheet(name.to_string()))
}

fn require_columns(
    sheet: &SourceSheet,
    name: &str,
    expected: usize,
) -> Result<(), ReportError> {
    let found = sheet.rows.first().map(Vec::len).unwrap_or(0);
    if found < expected {
        return Err(ReportError::MissingColumns {
            sheet: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// True for roster/lookup keys that mean "no entry": blanks and the literal
/// `nan` a float-typed column renders missing values as.
pub(crate) fn is_blank_key(key: &str) -> bool {
    key.is_empty() || key.eq_ignore_ascii_case("nan")
}

/// Load the employee roster: first column, header row skipped, blanks and
/// `nan` placeholders dropped. Order is preserved (it becomes tab order).
pub fn load_employees(
    workbook: &SourceWorkbook,
    config: &ReportConfig,
) -> Result<Vec<String>, ReportError> {
    let sheet = require_sheet(workbook, &config.employees_sheet)?;
    require_columns(sheet, &config.employees_sheet, 1)?;

    let mut names = Vec::new();
    for row in sheet.rows.iter().skip(1) {
        let name = row
            .first()
            .map(|v| v.display_text())
            .unwrap_or_default()
            .trim()
            .to_string();
        if !is_blank_key(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Load production records with employee names forward-filled: a record with
/// a blank name belongs to the most recent named employee above it, matching
/// how the source sheet is filled in by hand.
pub fn load_production(
    workbook: &SourceWorkbook,
    config: &ReportConfig,
) -> Result<Vec<ProductionRecord>, ReportError> {
    let sheet = require_sheet(workbook, &config.production_sheet)?;
    require_columns(sheet, &config.production_sheet, PROD_COL_QUANTITY + 1)?;

    let mut records = Vec::new();
    let mut current_employee = String::new();

    for row in sheet.rows.iter().skip(1) {
        let cell = |col: usize| row.get(col).cloned().unwrap_or(CellValue::Empty);

        let name = cell(PROD_COL_EMPLOYEE).display_text().trim().to_string();
        if !name.is_empty() {
            current_employee = name;
        }

        records.push(ProductionRecord {
            employee: current_employee.clone(),
            date: cell(PROD_COL_DATE),
            product: cell(PROD_COL_PRODUCT).display_text().trim().to_string(),
            quantity: cell(PROD_COL_QUANTITY),
        });
    }
    Ok(records)
}

/// Load a two-column key/value sheet (prices or subsistence) as ordered
/// `(key, value)` pairs with blank/`nan` keys skipped. Keys are trimmed;
/// values pass through unvalidated.
pub fn load_keyed_rows(
    workbook: &SourceWorkbook,
    sheet_name: &str,
) -> Result<Vec<(String, CellValue)>, ReportError> {
    let sheet = require_sheet(workbook, sheet_name)?;
    require_columns(sheet, sheet_name, 2)?;

    let mut rows = Vec::new();
    for row in sheet.rows.iter().skip(1) {
        let key = row
            .first()
            .map(|v| v.display_text())
            .unwrap_or_default()
            .trim()
            .to_string();
        if is_blank_key(&key) {
            continue;
        }
        let value = row.get(1).cloned().unwrap_or(CellValue::Empty);
        rows.push((key, value));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(name: &str, rows: Vec<Vec<CellValue>>) -> SourceSheet {
        SourceSheet {
            name: name.to_string(),
            rows,
        }
    }

    fn workbook_with(sheets: Vec<SourceSheet>) -> SourceWorkbook {
        SourceWorkbook { sheets }
    }

    fn s(text: &str) -> CellValue {
        CellValue::String(text.to_string())
    }

    #[test]
    fn roster_skips_blank_and_nan_rows() {
        let wb = workbook_with(vec![sheet(
            "Employees",
            vec![
                vec![s("Name")],
                vec![s("  Zhang San ")],
                vec![CellValue::Empty],
                vec![s("nan")],
                vec![s("Li Si")],
            ],
        )]);
        let names = load_employees(&wb, &ReportConfig::default()).unwrap();
        assert_eq!(names, vec!["Zhang San".to_string(), "Li Si".to_string()]);
    }

    #[test]
    fn missing_sheet_is_a_structural_error() {
        let wb = workbook_with(vec![]);
        let err = load_employees(&wb, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::MissingSheet(name) if name == "Employees"));
    }

    #[test]
    fn production_needs_five_header_columns() {
        let wb = workbook_with(vec![sheet(
            "Production",
            vec![vec![s("id"), s("employee"), s("date")]],
        )]);
        let err = load_production(&wb, &ReportConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingColumns {
                expected: 5,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn production_names_forward_fill() {
        let header = vec![s("id"), s("employee"), s("date"), s("product"), s("qty")];
        let wb = workbook_with(vec![sheet(
            "Production",
            vec![
                header,
                vec![
                    CellValue::Empty,
                    s("Zhang San"),
                    s("2025-10-01"),
                    s("teacup"),
                    CellValue::Number(100.0),
                ],
                vec![
                    CellValue::Empty,
                    CellValue::Empty,
                    s("2025-10-02"),
                    s("saucer"),
                    CellValue::Number(50.0),
                ],
                vec![
                    CellValue::Empty,
                    s("Li Si"),
                    s("2025-10-02"),
                    s("teacup"),
                    CellValue::Number(70.0),
                ],
            ],
        )]);
        let records = load_production(&wb, &ReportConfig::default()).unwrap();
        let owners: Vec<&str> = records.iter().map(|r| r.employee.as_str()).collect();
        assert_eq!(owners, vec!["Zhang San", "Zhang San", "Li Si"]);
        assert_eq!(records[1].product, "saucer");
        assert_eq!(records[1].quantity, CellValue::Number(50.0));
    }

    #[test]
    fn keyed_rows_keep_order_and_raw_values() {
        let wb = workbook_with(vec![sheet(
            "PriceList",
            vec![
                vec![s("product"), s("price")],
                vec![s("teacup"), CellValue::Number(1.2)],
                vec![s(""), CellValue::Number(9.0)],
                vec![s("saucer"), s("not a number")],
            ],
        )]);
        let rows = load_keyed_rows(&wb, "PriceList").unwrap();
        assert_eq!(
            rows,
            vec![
                ("teacup".to_string(), CellValue::Number(1.2)),
                ("saucer".to_string(), s("not a number")),
            ]
        );
    }
}
