//! Workbook assembly: one ledger sheet per rostered employee.

use log::{debug, info};
use paysheet_model::Workbook;
use paysheet_xlsx::SourceWorkbook;

use crate::layout::{render_ledger, LedgerStyle};
use crate::lookup::{build_table, subsistence_for};
use crate::source::{load_employees, load_keyed_rows, load_production};
use crate::{filter, ReportConfig, ReportError, TargetMonth};

/// What one employee's sheet ended up as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetSummary {
    pub employee: String,
    /// The (possibly sanitized and suffixed) tab name.
    pub sheet_name: String,
    /// Production records matched for the target month.
    pub record_count: usize,
    /// Records skipped because their date cell could not be resolved.
    pub unresolved_dates: usize,
}

/// Result of a report run: the assembled workbook plus per-sheet accounting.
#[derive(Debug)]
pub struct ReportOutcome {
    pub workbook: Workbook,
    pub sheets: Vec<SheetSummary>,
}

impl ReportOutcome {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}

/// Run the full transformation: extract tables, build lookups, and render one
/// ledger per employee in roster order.
///
/// Fails only on structural problems (missing sheets/columns, empty roster);
/// data-quality issues end up as flagged cells in the output.
pub fn build_report(
    source: &SourceWorkbook,
    month: TargetMonth,
    config: &ReportConfig,
    style: &LedgerStyle,
) -> Result<ReportOutcome, ReportError> {
    let employees = load_employees(source, config)?;
    if employees.is_empty() {
        return Err(ReportError::NoEmployees);
    }
    let production = load_production(source, config)?;
    let prices = build_table(load_keyed_rows(source, &config.prices_sheet)?, "prices");
    let subsistence = build_table(
        load_keyed_rows(source, &config.subsistence_sheet)?,
        "subsistence",
    );

    let mut workbook = Workbook::new();
    let mut sheets = Vec::with_capacity(employees.len());

    for employee in &employees {
        let (records, unresolved_dates) = filter::filter_records(&production, employee, month);
        let allowance = subsistence_for(&subsistence, employee);

        let sheet_id = workbook.add_sheet_for(employee);
        render_ledger(
            &mut workbook,
            sheet_id,
            employee,
            month,
            &records,
            &prices,
            allowance,
            style,
        );

        let sheet_name = workbook
            .sheet(sheet_id)
            .expect("sheet was just added")
            .name
            .clone();
        if sheet_name != *employee {
            debug!("employee '{employee}' renders on tab '{sheet_name}'");
        }
        info!("generated ledger for {employee}: {} records", records.len());
        sheets.push(SheetSummary {
            employee: employee.clone(),
            sheet_name,
            record_count: records.len(),
            unresolved_dates,
        });
    }

    Ok(ReportOutcome { workbook, sheets })
}

/// Output filename for a run: `<month>_<label>.xlsx`.
pub fn output_filename(month: TargetMonth, label: &str) -> String {
    format!("{month}_{label}.xlsx")
}

#[cfg(test)]
mod tests {
    use super::*;
    use paysheet_model::CellValue;
    use paysheet_xlsx::SourceSheet;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> CellValue {
        CellValue::String(text.to_string())
    }

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn sheet(name: &str, rows: Vec<Vec<CellValue>>) -> SourceSheet {
        SourceSheet {
            name: name.to_string(),
            rows,
        }
    }

    fn source_fixture(employee_rows: Vec<Vec<CellValue>>) -> SourceWorkbook {
        SourceWorkbook {
            sheets: vec![
                sheet("Employees", employee_rows),
                sheet(
                    "Production",
                    vec![
                        vec![s("id"), s("employee"), s("date"), s("product"), s("qty")],
                        vec![
                            CellValue::Empty,
                            s("Zhang San"),
                            s("2025-10-01"),
                            s("teacup"),
                            n(100.0),
                        ],
                        vec![
                            CellValue::Empty,
                            CellValue::Empty,
                            s("2025-10-02"),
                            s("saucer"),
                            n(40.0),
                        ],
                        vec![
                            CellValue::Empty,
                            s("Li Si"),
                            s("2025-09-30"),
                            s("teacup"),
                            n(70.0),
                        ],
                    ],
                ),
                sheet(
                    "PriceList",
                    vec![
                        vec![s("product"), s("price")],
                        vec![s("teacup"), n(1.5)],
                        vec![s("saucer"), n(0.8)],
                    ],
                ),
                sheet(
                    "Subsistence",
                    vec![
                        vec![s("employee"), s("allowance")],
                        vec![s("Zhang San"), n(300.0)],
                    ],
                ),
            ],
        }
    }

    fn roster(names: &[&str]) -> Vec<Vec<CellValue>> {
        let mut rows = vec![vec![s("name")]];
        rows.extend(names.iter().map(|name| vec![s(name)]));
        rows
    }

    #[test]
    fn one_sheet_per_employee_in_roster_order() {
        let source = source_fixture(roster(&["Zhang San", "Li Si"]));
        let month: TargetMonth = "2025-10".parse().unwrap();
        let outcome = build_report(
            &source,
            month,
            &ReportConfig::default(),
            &LedgerStyle::default(),
        )
        .unwrap();

        assert_eq!(outcome.sheet_count(), 2);
        assert_eq!(outcome.sheets[0].employee, "Zhang San");
        assert_eq!(outcome.sheets[0].record_count, 2); // forward-filled second row
        assert_eq!(outcome.sheets[1].employee, "Li Si");
        assert_eq!(outcome.sheets[1].record_count, 0); // September record filtered out
        let names: Vec<&str> = outcome
            .workbook
            .sheets
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Zhang San", "Li Si"]);
    }

    #[test]
    fn colliding_safe_names_get_suffixes() {
        let long_a = format!("{}/A", "x".repeat(35));
        let long_b = format!("{}/B", "x".repeat(35));
        let source = source_fixture(roster(&[&long_a, &long_b]));
        let month: TargetMonth = "2025-10".parse().unwrap();
        let outcome = build_report(
            &source,
            month,
            &ReportConfig::default(),
            &LedgerStyle::default(),
        )
        .unwrap();

        let names: Vec<&str> = outcome
            .workbook
            .sheets
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names[0], "x".repeat(31));
        assert_eq!(names[1], format!("{}-2", "x".repeat(29)));
    }

    #[test]
    fn empty_roster_is_an_error() {
        let source = source_fixture(vec![vec![s("name")]]);
        let month: TargetMonth = "2025-10".parse().unwrap();
        let err = build_report(
            &source,
            month,
            &ReportConfig::default(),
            &LedgerStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::NoEmployees));
    }

    #[test]
    fn filenames_embed_month_and_label() {
        let month: TargetMonth = "2025-10".parse().unwrap();
        assert_eq!(output_filename(month, "payroll"), "2025-10_payroll.xlsx");
    }
}
