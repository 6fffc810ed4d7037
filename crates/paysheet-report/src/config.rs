use serde::{Deserialize, Serialize};

/// Names of the required tables in the source workbook, plus the output
/// label.
///
/// The defaults match the documented source layout; deployments whose source
/// workbooks use localized tab names override them from the CLI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Sheet holding the employee roster (column A = name).
    pub employees_sheet: String,
    /// Sheet holding production records (B = employee, C = date, D = product,
    /// E = quantity).
    pub production_sheet: String,
    /// Sheet mapping product name → unit price (columns A/B).
    pub prices_sheet: String,
    /// Sheet mapping employee → subsistence allowance (columns A/B).
    pub subsistence_sheet: String,
    /// Label used in the output filename: `<month>_<label>.xlsx`.
    pub label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            employees_sheet: "Employees".to_string(),
            production_sheet: "Production".to_string(),
            prices_sheet: "PriceList".to_string(),
            subsistence_sheet: "Subsistence".to_string(),
            label: "payroll".to_string(),
        }
    }
}
