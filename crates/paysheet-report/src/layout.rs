//! The ledger layout engine.
//!
//! Turns one employee's filtered production records into a fully formatted
//! two-column worksheet: detail lines split across a left and right block,
//! live `qty*price` formulas, data-quality highlighting, and a summary row
//! whose total formula excludes flagged lines.
//!
//! The engine never fails on bad business data. A price that is missing,
//! non-numeric or zero is written as 0 with the error fill; an invalid or
//! zero quantity flags both the quantity cell and its amount cell. Reviewers
//! fix the source sheet and rerun.

use std::collections::HashMap;

use log::debug;
use paysheet_model::{
    Alignment, Border, BorderStyle, CellRef, CellValue, Color, Fill, Font, HorizontalAlignment,
    Orientation, PageMargins, PageSetup, PaperSize, Range, Style, StyleTable,
    VerticalAlignment, Workbook, Worksheet, WorksheetId,
};

use crate::filter::resolve_date;
use crate::lookup::price_for;
use crate::source::ProductionRecord;
use crate::TargetMonth;

/// Fixed sheet geometry (0-indexed). The left block spans columns A-E, the
/// right block G-K, with F as a spacer.
const ROW_TITLE: u32 = 0;
const ROW_EMPLOYEE: u32 = 1;
const ROW_HEADER: u32 = 2;
const ROW_FIRST_DETAIL: u32 = 3;

const COL_SPACER: u32 = 5;
const COL_LAST: u32 = 10;
const RIGHT_BLOCK_OFFSET: u32 = 6;

/// Column roles within one five-column block.
const BLOCK_DATE: u32 = 0;
const BLOCK_PRODUCT: u32 = 1;
const BLOCK_QTY: u32 = 2;
const BLOCK_PRICE: u32 = 3;
const BLOCK_AMOUNT: u32 = 4;

const HEADERS: [&str; 5] = ["Date", "Product", "Qty", "Price", "Amount"];
const EMPLOYEE_LABEL: &str = "Employee:";
const SUBSISTENCE_LABEL: &str = "Subsistence:";
const TOTAL_LABEL: &str = "Total:";

/// 3% of the gross piece-rate total is withheld before the subsistence
/// deduction.
const PAYOUT_FACTOR: &str = "0.97";

const COLUMN_WIDTHS: [f64; 11] = [
    7.25, 18.0, 6.25, 5.75, 7.18, // left block
    2.0, // spacer
    7.25, 18.0, 6.25, 5.75, 7.18, // right block
];

const HEIGHT_TITLE: f64 = 35.0;
const HEIGHT_EMPLOYEE: f64 = 25.0;
const HEIGHT_TABLE_ROW: f64 = 21.0;

/// Immutable styling configuration for ledger sheets.
///
/// One value is built per run and passed into the engine; nothing styling-
/// related lives in module state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerStyle {
    /// Highlight for cells holding missing/zero/invalid values.
    pub error_fill: Color,
    /// Header row shading.
    pub header_fill: Color,
    /// Grid border color.
    pub border_color: Color,
    /// Font for everything inside the table region.
    pub body_font: Font,
    /// Font for the merged title row.
    pub title_font: Font,
}

impl Default for LedgerStyle {
    fn default() -> Self {
        Self {
            error_fill: Color::new_rgb(0xFFFF00),
            header_fill: Color::new_rgb(0xF2F2F2),
            border_color: Color::new_rgb(0xBFBFBF),
            body_font: Font {
                name: Some("Microsoft YaHei".to_string()),
                size_100pt: Some(1200),
                bold: false,
            },
            title_font: Font {
                name: Some("SimHei".to_string()),
                size_100pt: Some(1600),
                bold: true,
            },
        }
    }
}

/// Style ids interned once per sheet render.
struct LedgerStyleIds {
    title: u32,
    employee_line: u32,
    header_date: u32,
    header_text: u32,
    header_numeric: u32,
    date_text: u32,
    date_serial: u32,
    product: u32,
    numeric: u32,
    numeric_error: u32,
    total: u32,
    blank: u32,
}

impl LedgerStyleIds {
    fn intern(cfg: &LedgerStyle, styles: &mut StyleTable) -> Self {
        let border = Border::uniform(BorderStyle::Thin, Some(cfg.border_color));
        let align = |horizontal: Option<HorizontalAlignment>| {
            Some(Alignment {
                horizontal,
                vertical: Some(VerticalAlignment::Center),
            })
        };
        let bold_body = Font {
            bold: true,
            ..cfg.body_font.clone()
        };
        let table = |horizontal: Option<HorizontalAlignment>| Style {
            font: Some(cfg.body_font.clone()),
            border: Some(border.clone()),
            alignment: align(horizontal),
            ..Style::default()
        };
        let header = |horizontal: Option<HorizontalAlignment>| Style {
            font: Some(bold_body.clone()),
            fill: Some(Fill {
                background: Some(cfg.header_fill),
            }),
            border: Some(border.clone()),
            alignment: align(horizontal),
            ..Style::default()
        };
        let with_error_fill = |style: Style| Style {
            fill: Some(Fill {
                background: Some(cfg.error_fill),
            }),
            ..style
        };
        let with_number_format = |style: Style, code: &str| Style {
            number_format: Some(code.to_string()),
            ..style
        };

        Self {
            title: styles.intern(Style {
                font: Some(cfg.title_font.clone()),
                alignment: align(Some(HorizontalAlignment::Center)),
                ..Style::default()
            }),
            employee_line: styles.intern(Style {
                font: Some(bold_body.clone()),
                ..Style::default()
            }),
            header_date: styles.intern(header(Some(HorizontalAlignment::Center))),
            header_text: styles.intern(header(Some(HorizontalAlignment::Left))),
            header_numeric: styles.intern(header(Some(HorizontalAlignment::Right))),
            date_text: styles.intern(table(Some(HorizontalAlignment::Center))),
            date_serial: styles.intern(with_number_format(
                table(Some(HorizontalAlignment::Center)),
                "m/d",
            )),
            product: styles.intern(table(Some(HorizontalAlignment::Left))),
            numeric: styles.intern(table(Some(HorizontalAlignment::Right))),
            numeric_error: styles.intern(with_error_fill(table(Some(
                HorizontalAlignment::Right,
            )))),
            total: styles.intern(with_number_format(
                table(Some(HorizontalAlignment::Right)),
                "0",
            )),
            blank: styles.intern(table(None)),
        }
    }

    /// Base style for a filler cell, by absolute column.
    fn base_for_column(&self, col: u32) -> u32 {
        if col == COL_SPACER {
            return self.blank;
        }
        let role = if col < COL_SPACER {
            col
        } else {
            col - RIGHT_BLOCK_OFFSET
        };
        match role {
            BLOCK_DATE => self.date_text,
            BLOCK_PRODUCT => self.product,
            _ => self.numeric,
        }
    }
}

/// Lay one employee's ledger out on the given (fresh) worksheet.
///
/// `records` is the month-filtered selection in source order; `subsistence`
/// is the raw allowance cell for this employee, or `None` when the
/// subsistence table has no entry.
pub fn render_ledger(
    workbook: &mut Workbook,
    sheet_id: WorksheetId,
    employee: &str,
    month: TargetMonth,
    records: &[&ProductionRecord],
    prices: &HashMap<String, CellValue>,
    subsistence: Option<&CellValue>,
    style: &LedgerStyle,
) {
    let ids = LedgerStyleIds::intern(style, &mut workbook.styles);
    let sheet = workbook
        .sheet_mut(sheet_id)
        .expect("ledger sheet was just created");

    render_title(sheet, &ids, employee, month);
    render_headers(sheet, &ids);

    // Left block gets ceil(n/2) lines, right block the remainder, preserving
    // source order across left-then-right.
    let left_count = records.len().div_ceil(2);
    let (left, right) = records.split_at(left_count);
    render_block(sheet, &ids, 0, left, prices);
    render_block(sheet, &ids, RIGHT_BLOCK_OFFSET, right, prices);

    reflag_amounts(sheet, &ids, 0, left.len() as u32);
    reflag_amounts(sheet, &ids, RIGHT_BLOCK_OFFSET, right.len() as u32);

    // One past the last populated detail row across both halves; the left
    // block is never shorter than the right. At least one (blank) detail row
    // is kept so the total's SUMIF ranges never touch the summary row itself.
    let summary_row = ROW_FIRST_DETAIL + (left.len() as u32).max(1);
    render_summary(sheet, &ids, summary_row, subsistence);

    fill_table_region(sheet, &ids, summary_row);
    apply_dimensions(sheet, summary_row);
    sheet.page_setup = landscape_fit_to_page();
}

fn render_title(sheet: &mut Worksheet, ids: &LedgerStyleIds, employee: &str, month: TargetMonth) {
    let title = CellRef::new(ROW_TITLE, 0);
    sheet.set_value(title, format!("{month} wage detail: {employee}"));
    sheet.set_style(title, ids.title);
    sheet
        .merge(Range::new(title, CellRef::new(ROW_TITLE, COL_LAST)))
        .expect("title merge is the first merge on a fresh sheet");

    let label = CellRef::new(ROW_EMPLOYEE, 0);
    sheet.set_value(label, format!("{EMPLOYEE_LABEL} {employee}"));
    sheet.set_style(label, ids.employee_line);
}

fn render_headers(sheet: &mut Worksheet, ids: &LedgerStyleIds) {
    for block_start in [0, RIGHT_BLOCK_OFFSET] {
        for (i, header) in HEADERS.iter().enumerate() {
            let at = CellRef::new(ROW_HEADER, block_start + i as u32);
            sheet.set_value(at, *header);
            let style = match i as u32 {
                BLOCK_DATE => ids.header_date,
                BLOCK_PRODUCT => ids.header_text,
                _ => ids.header_numeric,
            };
            sheet.set_style(at, style);
        }
    }
}

/// Render one block (left or right) of detail lines.
fn render_block(
    sheet: &mut Worksheet,
    ids: &LedgerStyleIds,
    block_start: u32,
    records: &[&ProductionRecord],
    prices: &HashMap<String, CellValue>,
) {
    for (i, record) in records.iter().enumerate() {
        let row = ROW_FIRST_DETAIL + i as u32;
        let cell_at = |role: u32| CellRef::new(row, block_start + role);

        let date_at = cell_at(BLOCK_DATE);
        match &record.date {
            CellValue::Number(serial) if resolve_date(&record.date).is_some() => {
                sheet.set_value(date_at, *serial);
                sheet.set_style(date_at, ids.date_serial);
            }
            CellValue::Empty => sheet.set_style(date_at, ids.date_text),
            other => {
                sheet.set_value(date_at, other.display_text());
                sheet.set_style(date_at, ids.date_text);
            }
        }

        let product_at = cell_at(BLOCK_PRODUCT);
        if !record.product.is_empty() {
            sheet.set_value(product_at, record.product.as_str());
        }
        sheet.set_style(product_at, ids.product);

        let qty_at = cell_at(BLOCK_QTY);
        let qty = record.quantity.as_number();
        if record.quantity != CellValue::Empty {
            sheet.set_value(qty_at, record.quantity.clone());
        }
        let qty_ok = qty.is_some_and(|n| n != 0.0);
        sheet.set_style(qty_at, if qty_ok { ids.numeric } else { ids.numeric_error });
        if !qty_ok {
            debug!(
                "flagged quantity {:?} for product '{}'",
                record.quantity, record.product
            );
        }

        // The price cell always gets a numeric value so the amount formula
        // stays calculable; unusable prices become 0 and are flagged.
        let price_at = cell_at(BLOCK_PRICE);
        let price = price_for(prices, &record.product).and_then(CellValue::as_number);
        let price_ok = price.is_some_and(|n| n != 0.0);
        sheet.set_value(price_at, price.filter(|_| price_ok).unwrap_or(0.0));
        sheet.set_style(price_at, if price_ok { ids.numeric } else { ids.numeric_error });
        if !price_ok {
            debug!("flagged price for product '{}'", record.product);
        }

        let amount_at = cell_at(BLOCK_AMOUNT);
        sheet.set_formula(amount_at, format!("{}*{}", qty_at.to_a1(), price_at.to_a1()));
        let amount_style = if qty_ok { ids.numeric } else { ids.numeric_error };
        sheet.set_style(amount_at, amount_style);
    }
}

/// Re-derive amount flags from the rendered lines: an amount is flagged when
/// its quantity or price cell is flagged, or when either value fails numeric
/// validation or equals zero. Line rendering already applied the same rule,
/// so this pass is an idempotent re-check.
fn reflag_amounts(sheet: &mut Worksheet, ids: &LedgerStyleIds, block_start: u32, line_count: u32) {
    for row in ROW_FIRST_DETAIL..ROW_FIRST_DETAIL + line_count {
        let qty_at = CellRef::new(row, block_start + BLOCK_QTY);
        let price_at = CellRef::new(row, block_start + BLOCK_PRICE);
        let amount_at = CellRef::new(row, block_start + BLOCK_AMOUNT);

        let qty = sheet.value(qty_at).as_number();
        let price = sheet.value(price_at).as_number();
        let should_flag = sheet.style_id(qty_at) == ids.numeric_error
            || sheet.style_id(price_at) == ids.numeric_error
            || qty.map_or(true, |n| n == 0.0)
            || price.map_or(true, |n| n == 0.0);
        if should_flag {
            sheet.set_style(amount_at, ids.numeric_error);
        }
    }
}

fn render_summary(
    sheet: &mut Worksheet,
    ids: &LedgerStyleIds,
    summary_row: u32,
    subsistence: Option<&CellValue>,
) {
    let label_at = CellRef::new(summary_row, RIGHT_BLOCK_OFFSET + BLOCK_PRODUCT);
    sheet.set_value(label_at, SUBSISTENCE_LABEL);
    sheet.set_style(label_at, ids.product);

    // A missing or non-numeric allowance is written as 0 and flagged, like
    // any other data-quality problem.
    let value_at = CellRef::new(summary_row, RIGHT_BLOCK_OFFSET + BLOCK_QTY);
    let allowance = subsistence.and_then(CellValue::as_number);
    sheet.set_value(value_at, allowance.unwrap_or(0.0));
    sheet.set_style(
        value_at,
        if allowance.is_some() {
            ids.numeric
        } else {
            ids.numeric_error
        },
    );
    if allowance.is_none() {
        debug!("flagged subsistence value {subsistence:?}");
    }

    let total_label_at = CellRef::new(summary_row, RIGHT_BLOCK_OFFSET + BLOCK_PRICE);
    sheet.set_value(total_label_at, TOTAL_LABEL);
    sheet.set_style(total_label_at, ids.numeric);

    let total_at = CellRef::new(summary_row, RIGHT_BLOCK_OFFSET + BLOCK_AMOUNT);
    let detail_end = summary_row - 1;
    let left_amounts = Range::column_span(BLOCK_AMOUNT, ROW_FIRST_DETAIL, detail_end);
    let right_amounts = Range::column_span(
        RIGHT_BLOCK_OFFSET + BLOCK_AMOUNT,
        ROW_FIRST_DETAIL,
        detail_end,
    );
    // SUMIF(..., ">0") skips flagged/zero lines, so the payout total only
    // counts amounts that survived validation.
    sheet.set_formula(
        total_at,
        format!(
            "(SUMIF({left_amounts},\">0\")+SUMIF({right_amounts},\">0\"))*{PAYOUT_FACTOR}-{subsist}",
            subsist = value_at.to_a1()
        ),
    );
    sheet.set_style(total_at, ids.total);
}

/// Give every untouched cell in the table region its column's base style so
/// the grid of borders is continuous, including the spacer column and the
/// shorter block's unused rows.
fn fill_table_region(sheet: &mut Worksheet, ids: &LedgerStyleIds, summary_row: u32) {
    for row in ROW_HEADER..=summary_row {
        for col in 0..=COL_LAST {
            let at = CellRef::new(row, col);
            if sheet.style_id(at) == 0 {
                sheet.set_style(at, ids.base_for_column(col));
            }
        }
    }
}

fn apply_dimensions(sheet: &mut Worksheet, summary_row: u32) {
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_col_width(col as u32, *width);
    }
    sheet.set_row_height(ROW_TITLE, HEIGHT_TITLE);
    sheet.set_row_height(ROW_EMPLOYEE, HEIGHT_EMPLOYEE);
    for row in ROW_HEADER..=summary_row {
        sheet.set_row_height(row, HEIGHT_TABLE_ROW);
    }
}

fn landscape_fit_to_page() -> PageSetup {
    PageSetup {
        orientation: Orientation::Landscape,
        paper_size: PaperSize::A4,
        fit_to_width: Some(1),
        fit_to_height: Some(1),
        horizontal_centered: true,
        margins: PageMargins::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(date: &str, product: &str, quantity: CellValue) -> ProductionRecord {
        ProductionRecord {
            employee: "Zhang San".to_string(),
            date: CellValue::String(date.to_string()),
            product: product.to_string(),
            quantity,
        }
    }

    fn prices(pairs: &[(&str, f64)]) -> HashMap<String, CellValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Number(*v)))
            .collect()
    }

    fn render(
        records: Vec<ProductionRecord>,
        prices: &HashMap<String, CellValue>,
        subsistence: Option<CellValue>,
    ) -> Workbook {
        let mut wb = Workbook::new();
        let id = wb.add_sheet_for("Zhang San");
        let month: TargetMonth = "2025-10".parse().unwrap();
        let refs: Vec<&ProductionRecord> = records.iter().collect();
        render_ledger(
            &mut wb,
            id,
            "Zhang San",
            month,
            &refs,
            prices,
            subsistence.as_ref(),
            &LedgerStyle::default(),
        );
        wb
    }

    fn has_error_fill(wb: &Workbook, at: CellRef) -> bool {
        let sheet = &wb.sheets[0];
        let style = wb.styles.get(sheet.style_id(at)).unwrap();
        style
            .fill
            .as_ref()
            .and_then(|f| f.background)
            .map(|c| c == LedgerStyle::default().error_fill)
            .unwrap_or(false)
    }

    fn a1(s: &str) -> CellRef {
        CellRef::from_a1(s).unwrap()
    }

    #[test]
    fn valid_lines_are_not_flagged_and_amounts_reference_their_row() {
        let prices = prices(&[("teacup", 1.5)]);
        let wb = render(
            vec![record("2025-10-01", "teacup", CellValue::Number(100.0))],
            &prices,
            Some(CellValue::Number(300.0)),
        );
        let sheet = &wb.sheets[0];

        assert_eq!(sheet.value(a1("C4")), CellValue::Number(100.0));
        assert_eq!(sheet.value(a1("D4")), CellValue::Number(1.5));
        assert_eq!(
            sheet.cell(a1("E4")).unwrap().formula.as_deref(),
            Some("C4*D4")
        );
        assert!(!has_error_fill(&wb, a1("C4")));
        assert!(!has_error_fill(&wb, a1("D4")));
        assert!(!has_error_fill(&wb, a1("E4")));
    }

    #[test]
    fn unknown_product_flags_price_and_amount() {
        let prices = prices(&[]);
        let wb = render(
            vec![record("2025-10-01", "vase", CellValue::Number(10.0))],
            &prices,
            None,
        );
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.value(a1("D4")), CellValue::Number(0.0));
        assert!(has_error_fill(&wb, a1("D4")));
        assert!(has_error_fill(&wb, a1("E4")));
        assert!(!has_error_fill(&wb, a1("C4")));
    }

    #[test]
    fn bad_quantities_flag_quantity_and_amount() {
        let prices = prices(&[("teacup", 2.0)]);
        let wb = render(
            vec![
                record("2025-10-01", "teacup", CellValue::Number(0.0)),
                record("2025-10-02", "teacup", CellValue::String("a few".into())),
                record("2025-10-03", "teacup", CellValue::Empty),
            ],
            &prices,
            None,
        );
        // Three lines split 2/1: rows 4-5 on the left, row 4 on the right.
        for cell in ["C4", "E4", "C5", "E5", "I4", "K4"] {
            assert!(has_error_fill(&wb, a1(cell)), "{cell} should be flagged");
        }
        assert!(!has_error_fill(&wb, a1("D4")));
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.value(a1("C5")), CellValue::String("a few".into()));
    }

    #[test]
    fn lines_split_left_heavy_and_preserve_order() {
        let prices = prices(&[("teacup", 1.0)]);
        let days = ["01", "02", "03", "04", "05"];
        let records: Vec<ProductionRecord> = days
            .iter()
            .map(|d| {
                record(
                    &format!("2025-10-{d}"),
                    "teacup",
                    CellValue::Number(10.0),
                )
            })
            .collect();
        let wb = render(records, &prices, None);
        let sheet = &wb.sheets[0];

        // ceil(5/2) = 3 lines on the left, 2 on the right.
        let left: Vec<CellValue> = (0..3)
            .map(|i| sheet.value(CellRef::new(ROW_FIRST_DETAIL + i, 0)))
            .collect();
        let right: Vec<CellValue> = (0..2)
            .map(|i| sheet.value(CellRef::new(ROW_FIRST_DETAIL + i, RIGHT_BLOCK_OFFSET)))
            .collect();
        let dates: Vec<String> = left
            .iter()
            .chain(right.iter())
            .map(|v| v.display_text())
            .collect();
        assert_eq!(
            dates,
            vec![
                "2025-10-01",
                "2025-10-02",
                "2025-10-03",
                "2025-10-04",
                "2025-10-05"
            ]
        );
        // No third line on the right.
        assert_eq!(
            sheet.value(CellRef::new(ROW_FIRST_DETAIL + 2, RIGHT_BLOCK_OFFSET)),
            CellValue::Empty
        );
    }

    #[test]
    fn summary_row_sits_one_past_the_longer_block() {
        let prices = prices(&[("teacup", 1.0)]);
        let records: Vec<ProductionRecord> = (1..=5)
            .map(|d| {
                record(
                    &format!("2025-10-0{d}"),
                    "teacup",
                    CellValue::Number(10.0),
                )
            })
            .collect();
        let wb = render(records, &prices, Some(CellValue::Number(3.0)));
        let sheet = &wb.sheets[0];

        // Left block rows 4-6, so the summary lands on row 7.
        assert_eq!(sheet.value(a1("H7")), CellValue::String("Subsistence:".into()));
        assert_eq!(sheet.value(a1("I7")), CellValue::Number(3.0));
        assert_eq!(sheet.value(a1("J7")), CellValue::String("Total:".into()));
        assert_eq!(
            sheet.cell(a1("K7")).unwrap().formula.as_deref(),
            Some("(SUMIF(E4:E6,\">0\")+SUMIF(K4:K6,\">0\"))*0.97-I7")
        );
    }

    #[test]
    fn empty_ledgers_still_get_a_summary() {
        let prices = prices(&[]);
        let wb = render(vec![], &prices, None);
        let sheet = &wb.sheets[0];

        // One blank detail row is kept, so the summary is on row 5 and the
        // SUMIF ranges stop short of it.
        assert_eq!(
            sheet.cell(a1("K5")).unwrap().formula.as_deref(),
            Some("(SUMIF(E4:E4,\">0\")+SUMIF(K4:K4,\">0\"))*0.97-I5")
        );
        // Missing subsistence: written as 0 and flagged.
        assert_eq!(sheet.value(a1("I5")), CellValue::Number(0.0));
        assert!(has_error_fill(&wb, a1("I5")));
    }

    #[test]
    fn grid_styling_covers_spacer_and_short_block_rows() {
        let prices = prices(&[("teacup", 1.0)]);
        let records = vec![
            record("2025-10-01", "teacup", CellValue::Number(5.0)),
            record("2025-10-02", "teacup", CellValue::Number(5.0)),
            record("2025-10-03", "teacup", CellValue::Number(5.0)),
        ];
        let wb = render(records, &prices, Some(CellValue::Number(1.0)));
        let sheet = &wb.sheets[0];

        // 3 lines split 2/1: right block row 5 is unused but still bordered,
        // as is the spacer column.
        for cell in ["F3", "F4", "G5", "K5"] {
            let style_id = sheet.style_id(a1(cell));
            let style = wb.styles.get(style_id).unwrap();
            assert!(style.border.is_some(), "{cell} should be bordered");
        }
        // The unused right-block amount cell is not flagged: only rendered
        // lines carry data-quality highlights.
        assert!(!has_error_fill(&wb, a1("K5")));
    }

    #[test]
    fn serial_dates_keep_their_number_and_get_a_date_format() {
        let prices = prices(&[("teacup", 1.0)]);
        let mut records = vec![record("x", "teacup", CellValue::Number(5.0))];
        records[0].date = CellValue::Number(45931.0); // 2025-10-01
        let wb = render(records, &prices, None);
        let sheet = &wb.sheets[0];

        assert_eq!(sheet.value(a1("A4")), CellValue::Number(45931.0));
        let style = wb.styles.get(sheet.style_id(a1("A4"))).unwrap();
        assert_eq!(style.number_format.as_deref(), Some("m/d"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let prices = prices(&[("teacup", 1.5)]);
        let records = vec![record("2025-10-01", "teacup", CellValue::Number(7.0))];
        let a = render(records.clone(), &prices, Some(CellValue::Number(5.0)));
        let b = render(records, &prices, Some(CellValue::Number(5.0)));
        let bytes_a = paysheet_xlsx::write_to_vec(&a).unwrap();
        let bytes_b = paysheet_xlsx::write_to_vec(&b).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }
}
