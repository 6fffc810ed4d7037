//! Price and subsistence lookup tables.
//!
//! Both are plain exact-match maps keyed by trimmed names. Duplicate keys are
//! resolved last-write-wins (the bottom-most row of the source sheet is the
//! one a clerk edited most recently) and logged so the source can be cleaned
//! up.

use std::collections::HashMap;

use log::warn;
use paysheet_model::CellValue;

/// Build an exact-match lookup from ordered `(key, value)` rows.
pub fn build_table(rows: Vec<(String, CellValue)>, table_label: &str) -> HashMap<String, CellValue> {
    let mut map = HashMap::with_capacity(rows.len());
    for (key, value) in rows {
        if let Some(previous) = map.insert(key.clone(), value) {
            warn!("{table_label}: duplicate key '{key}' (previous value {previous:?} replaced)");
        }
    }
    map
}

/// Unit price for a product. Unknown products yield `None`; the layout engine
/// substitutes 0 and flags the cell.
pub fn price_for<'a>(prices: &'a HashMap<String, CellValue>, product: &str) -> Option<&'a CellValue> {
    prices.get(product.trim())
}

/// Subsistence allowance for an employee, by exact trimmed-name match.
pub fn subsistence_for<'a>(
    subsistence: &'a HashMap<String, CellValue>,
    employee: &str,
) -> Option<&'a CellValue> {
    subsistence.get(employee.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, f64)]) -> Vec<(String, CellValue)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Number(*v)))
            .collect()
    }

    #[test]
    fn duplicate_keys_are_last_write_wins() {
        let table = build_table(rows(&[("teacup", 1.0), ("teacup", 2.0)]), "prices");
        assert_eq!(table.get("teacup"), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn lookups_trim_but_do_not_fuzzy_match() {
        let table = build_table(rows(&[("Zhang San", 300.0)]), "subsistence");
        assert_eq!(
            subsistence_for(&table, "  Zhang San "),
            Some(&CellValue::Number(300.0))
        );
        // Substring relationships are not matches: the lookup is exact.
        assert_eq!(subsistence_for(&table, "Zhang"), None);
        assert_eq!(subsistence_for(&table, "Zhang San (temp)"), None);
    }

    #[test]
    fn unknown_product_is_none() {
        let table = build_table(rows(&[("teacup", 1.0)]), "prices");
        assert!(price_for(&table, "vase").is_none());
    }
}
