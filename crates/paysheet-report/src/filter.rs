//! Target-month parsing and per-employee record selection.
//!
//! Dates are resolved to a structured `(year, month)` and compared
//! numerically. Matching the month as a substring of the stringified date
//! would accept `2025-1` against `2025-10`/`2025-11`; parsing first closes
//! that hole.

use core::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use paysheet_model::CellValue;

use crate::source::ProductionRecord;

/// A calendar month, parsed from `YYYY-MM` (dots accepted as separators).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetMonth {
    pub year: i32,
    pub month: u32,
}

/// Errors raised when parsing a target month string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MonthParseError {
    #[error("month must look like YYYY-MM, got '{0}'")]
    Malformed(String),
    #[error("month number {0} is out of range 1-12")]
    MonthOutOfRange(u32),
}

impl FromStr for TargetMonth {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Clerks type `2025.10` as often as `2025-10`.
        let normalized = s.trim().replace('.', "-");
        let (year, month) = normalized
            .split_once('-')
            .ok_or_else(|| MonthParseError::Malformed(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::Malformed(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::Malformed(s.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for TargetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl TargetMonth {
    /// Does `date` fall in this month?
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// Anchor for Excel's 1900 date system. Serial 1 is 1900-01-01; anchoring at
/// 1899-12-30 also absorbs the fictitious 1900-02-29 for serials >= 61, which
/// covers every date a payroll sheet will ever hold.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Resolve a raw date cell to a calendar date.
///
/// Numbers are treated as Excel date serials; text is accepted in the formats
/// source sheets actually contain (`2025-10-05`, `2025/10/05`, optionally with
/// a trailing time-of-day). Anything else is unresolvable.
pub fn resolve_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(serial) => {
            if !serial.is_finite() || *serial < 1.0 {
                return None;
            }
            let (y, m, d) = EXCEL_EPOCH;
            let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
            epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
        }
        CellValue::String(text) => {
            let text = text.trim();
            // Strip a time-of-day suffix: "2025-10-05 08:30" / "2025-10-05T08:30".
            let date_part = text
                .split(|c: char| c.is_whitespace() || c == 'T')
                .next()
                .unwrap_or(text);
            for format in ["%Y-%m-%d", "%Y/%m/%d"] {
                if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                    return Some(date);
                }
            }
            None
        }
        _ => None,
    }
}

/// Select one employee's records for the target month, preserving source
/// order. Employee comparison is exact after trimming; records whose date
/// cannot be resolved never match and are reported via the returned count.
pub fn filter_records<'a>(
    records: &'a [ProductionRecord],
    employee: &str,
    month: TargetMonth,
) -> (Vec<&'a ProductionRecord>, usize) {
    let employee = employee.trim();
    let mut unresolved = 0usize;
    let mut selected = Vec::new();

    for record in records {
        if record.employee != employee {
            continue;
        }
        match resolve_date(&record.date) {
            Some(date) if month.contains(date) => selected.push(record),
            Some(_) => {}
            None => {
                unresolved += 1;
                debug!(
                    "unresolvable date {:?} for employee '{}' skipped",
                    record.date, employee
                );
            }
        }
    }
    (selected, unresolved)
}
