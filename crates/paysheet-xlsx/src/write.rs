use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Cursor, Write};
use std::path::Path;

use paysheet_model::{Border, CellValue, Fill, Font, StyleTable, Workbook, Worksheet};
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Errors raised while serializing a workbook.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("workbook has no sheets; refusing to write an unopenable file")]
    EmptyWorkbook,
}

/// Serialize a workbook to `.xlsx` bytes.
///
/// Parts are emitted in deterministic (sorted) order with fixed compression
/// options, so identical workbooks serialize to identical bytes and reruns
/// of the generator are byte-for-byte reproducible.
pub fn write_to_vec(workbook: &Workbook) -> Result<Vec<u8>, WriteError> {
    if workbook.sheets.is_empty() {
        return Err(WriteError::EmptyWorkbook);
    }

    let parts = build_parts(workbook);

    let cursor = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(cursor);
    let options =
        FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in &parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Serialize a workbook and write it to `path` in one step.
///
/// The bytes are fully assembled before the file is touched, so a failed run
/// never leaves a partial workbook behind.
pub fn write_to_file(path: &Path, workbook: &Workbook) -> Result<(), WriteError> {
    let bytes = write_to_vec(workbook)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn build_parts(workbook: &Workbook) -> BTreeMap<String, Vec<u8>> {
    let mut parts = BTreeMap::new();

    let (shared_strings_xml, shared_lookup) = build_shared_strings(workbook);

    parts.insert(
        "[Content_Types].xml".to_string(),
        content_types_xml(workbook.sheets.len()).into_bytes(),
    );
    parts.insert("_rels/.rels".to_string(), root_rels_xml().into_bytes());
    parts.insert(
        "xl/workbook.xml".to_string(),
        workbook_xml(workbook).into_bytes(),
    );
    parts.insert(
        "xl/_rels/workbook.xml.rels".to_string(),
        workbook_rels_xml(workbook.sheets.len()).into_bytes(),
    );
    parts.insert(
        "xl/styles.xml".to_string(),
        styles_xml(&workbook.styles).into_bytes(),
    );
    parts.insert(
        "xl/sharedStrings.xml".to_string(),
        shared_strings_xml.into_bytes(),
    );

    for (i, sheet) in workbook.sheets.iter().enumerate() {
        parts.insert(
            format!("xl/worksheets/sheet{}.xml", i + 1),
            worksheet_xml(sheet, &shared_lookup).into_bytes(),
        );
    }

    parts
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('\"', "&quot;")
        .replace('\'', "&apos;")
}

fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

/// Trailing-zero-free number formatting, matching how spreadsheet tools write
/// `<v>` elements (`12` rather than `12.0`).
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    for i in 0..sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
    }
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
        r#"</Relationships>"#
    )
    .to_string()
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    xml.push_str("<sheets>");
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_attr(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 0..sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1,
            i + 1
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    ));
    xml.push_str("</Relationships>");
    xml
}

fn build_shared_strings(workbook: &Workbook) -> (String, HashMap<String, u32>) {
    let mut table: Vec<String> = Vec::new();
    let mut lookup: HashMap<String, u32> = HashMap::new();
    let mut ref_count: u32 = 0;

    for sheet in &workbook.sheets {
        for (_, cell) in sheet.iter_cells() {
            if let CellValue::String(text) = &cell.value {
                ref_count += 1;
                if !lookup.contains_key(text) {
                    lookup.insert(text.clone(), table.len() as u32);
                    table.push(text.clone());
                }
            }
        }
    }

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main""#);
    xml.push_str(&format!(
        r#" count="{ref_count}" uniqueCount="{}">"#,
        table.len()
    ));
    for s in &table {
        xml.push_str("<si><t");
        if needs_space_preserve(s) {
            xml.push_str(r#" xml:space="preserve""#);
        }
        xml.push('>');
        xml.push_str(&escape_text(s));
        xml.push_str("</t></si>");
    }
    xml.push_str("</sst>");

    (xml, lookup)
}

/// Number format codes Excel treats as built-in; everything else is written
/// as a custom `<numFmt>` with an id from 164 up.
fn builtin_num_fmt_id(code: &str) -> Option<u32> {
    match code {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        _ => None,
    }
}

struct StyleComponents {
    num_fmt_ids: Vec<u32>,
    custom_num_fmts: Vec<(u32, String)>,
    font_ids: Vec<u32>,
    fonts: Vec<Font>,
    fill_ids: Vec<u32>,
    fills: Vec<Fill>,
    border_ids: Vec<u32>,
    borders: Vec<Border>,
}

/// Split the flat style table into the deduplicated component lists
/// `styles.xml` wants (fonts / fills / borders / number formats), assigning
/// each style its component ids.
///
/// Fill slots 0 and 1 are reserved: Excel expects `none` and `gray125` there.
fn split_styles(styles: &StyleTable) -> StyleComponents {
    let mut custom_num_fmts: Vec<(u32, String)> = Vec::new();
    let mut num_fmt_index: HashMap<String, u32> = HashMap::new();

    let mut fonts: Vec<Font> = vec![Font::default()];
    let mut font_index: HashMap<Font, u32> = HashMap::new();
    font_index.insert(Font::default(), 0);

    let mut fills: Vec<Fill> = vec![Fill::default(), Fill::default()];
    let mut fill_index: HashMap<Fill, u32> = HashMap::new();

    let mut borders: Vec<Border> = vec![Border::default()];
    let mut border_index: HashMap<Border, u32> = HashMap::new();
    border_index.insert(Border::default(), 0);

    let mut num_fmt_ids = Vec::with_capacity(styles.len());
    let mut font_ids = Vec::with_capacity(styles.len());
    let mut fill_ids = Vec::with_capacity(styles.len());
    let mut border_ids = Vec::with_capacity(styles.len());

    for style in &styles.styles {
        let num_fmt_id = match &style.number_format {
            None => 0,
            Some(code) => builtin_num_fmt_id(code).unwrap_or_else(|| {
                *num_fmt_index.entry(code.clone()).or_insert_with(|| {
                    let id = 164 + custom_num_fmts.len() as u32;
                    custom_num_fmts.push((id, code.clone()));
                    id
                })
            }),
        };
        num_fmt_ids.push(num_fmt_id);

        let font = style.font.clone().unwrap_or_default();
        let font_id = *font_index.entry(font.clone()).or_insert_with(|| {
            fonts.push(font);
            (fonts.len() - 1) as u32
        });
        font_ids.push(font_id);

        let fill_id = match &style.fill {
            None => 0,
            Some(fill) if fill.background.is_none() => 0,
            Some(fill) => *fill_index.entry(fill.clone()).or_insert_with(|| {
                fills.push(fill.clone());
                (fills.len() - 1) as u32
            }),
        };
        fill_ids.push(fill_id);

        let border = style.border.clone().unwrap_or_default();
        let border_id = *border_index.entry(border.clone()).or_insert_with(|| {
            borders.push(border);
            (borders.len() - 1) as u32
        });
        border_ids.push(border_id);
    }

    StyleComponents {
        num_fmt_ids,
        custom_num_fmts,
        font_ids,
        fonts,
        fill_ids,
        fills,
        border_ids,
        borders,
    }
}

fn font_xml(font: &Font) -> String {
    let mut out = String::from("<font>");
    if font.bold {
        out.push_str("<b/>");
    }
    let size = font.size_points().unwrap_or(11.0);
    out.push_str(&format!(r#"<sz val="{}"/>"#, format_number(size)));
    let name = font.name.as_deref().unwrap_or("Calibri");
    out.push_str(&format!(r#"<name val="{}"/>"#, escape_attr(name)));
    out.push_str("</font>");
    out
}

fn fill_xml(index: usize, fill: &Fill) -> String {
    // Slots 0/1 are the fixed none/gray125 fills.
    match index {
        0 => r#"<fill><patternFill patternType="none"/></fill>"#.to_string(),
        1 => r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string(),
        _ => {
            let color = fill
                .background
                .expect("solid fills past slot 1 always carry a color");
            format!(
                r#"<fill><patternFill patternType="solid"><fgColor rgb="{}"/><bgColor indexed="64"/></patternFill></fill>"#,
                color.to_xlsx_hex()
            )
        }
    }
}

fn border_xml(border: &Border) -> String {
    let edge = |tag: &str, style: paysheet_model::BorderStyle| -> String {
        match style.as_xlsx_str() {
            None => format!("<{tag}/>"),
            Some(s) => {
                let color = match border.color {
                    Some(c) => format!(r#"<color rgb="{}"/>"#, c.to_xlsx_hex()),
                    None => r#"<color auto="1"/>"#.to_string(),
                };
                format!(r#"<{tag} style="{s}">{color}</{tag}>"#)
            }
        }
    };
    format!(
        "<border>{}{}{}{}<diagonal/></border>",
        edge("left", border.left),
        edge("right", border.right),
        edge("top", border.top),
        edge("bottom", border.bottom),
    )
}

fn styles_xml(styles: &StyleTable) -> String {
    let parts = split_styles(styles);

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    if !parts.custom_num_fmts.is_empty() {
        xml.push_str(&format!(
            r#"<numFmts count="{}">"#,
            parts.custom_num_fmts.len()
        ));
        for (id, code) in &parts.custom_num_fmts {
            xml.push_str(&format!(
                r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                escape_attr(code)
            ));
        }
        xml.push_str("</numFmts>");
    }

    xml.push_str(&format!(r#"<fonts count="{}">"#, parts.fonts.len()));
    for font in &parts.fonts {
        xml.push_str(&font_xml(font));
    }
    xml.push_str("</fonts>");

    xml.push_str(&format!(r#"<fills count="{}">"#, parts.fills.len()));
    for (i, fill) in parts.fills.iter().enumerate() {
        xml.push_str(&fill_xml(i, fill));
    }
    xml.push_str("</fills>");

    xml.push_str(&format!(r#"<borders count="{}">"#, parts.borders.len()));
    for border in &parts.borders {
        xml.push_str(&border_xml(border));
    }
    xml.push_str("</borders>");

    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

    xml.push_str(&format!(r#"<cellXfs count="{}">"#, styles.len()));
    for (i, style) in styles.styles.iter().enumerate() {
        let num_fmt_id = parts.num_fmt_ids[i];
        let font_id = parts.font_ids[i];
        let fill_id = parts.fill_ids[i];
        let border_id = parts.border_ids[i];

        xml.push_str(&format!(
            r#"<xf numFmtId="{num_fmt_id}" fontId="{font_id}" fillId="{fill_id}" borderId="{border_id}" xfId="0""#
        ));
        if num_fmt_id != 0 {
            xml.push_str(r#" applyNumberFormat="1""#);
        }
        if font_id != 0 {
            xml.push_str(r#" applyFont="1""#);
        }
        if fill_id != 0 {
            xml.push_str(r#" applyFill="1""#);
        }
        if border_id != 0 {
            xml.push_str(r#" applyBorder="1""#);
        }
        match &style.alignment {
            Some(alignment) => {
                xml.push_str(r#" applyAlignment="1">"#);
                xml.push_str("<alignment");
                if let Some(h) = alignment.horizontal {
                    xml.push_str(&format!(r#" horizontal="{}""#, h.as_xlsx_str()));
                }
                if let Some(v) = alignment.vertical {
                    xml.push_str(&format!(r#" vertical="{}""#, v.as_xlsx_str()));
                }
                xml.push_str("/></xf>");
            }
            None => xml.push_str("/>"),
        }
    }
    xml.push_str("</cellXfs>");

    xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    xml.push_str("</styleSheet>");
    xml
}

fn worksheet_xml(sheet: &Worksheet, shared_lookup: &HashMap<String, u32>) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    let setup = &sheet.page_setup;
    if setup.fit_to_page() {
        xml.push_str(r#"<sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>"#);
    }

    let dimension = sheet
        .used_range()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "A1".to_string());
    xml.push_str(&format!(r#"<dimension ref="{dimension}"/>"#));

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for (col, width) in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{0}" max="{0}" width="{1}" customWidth="1"/>"#,
                col + 1,
                width
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str(&sheet_data_xml(sheet, shared_lookup));

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    if !setup.is_default() {
        if setup.horizontal_centered {
            xml.push_str(r#"<printOptions horizontalCentered="1"/>"#);
        }
        let m = setup.margins;
        xml.push_str(&format!(
            r#"<pageMargins left="{}" right="{}" top="{}" bottom="{}" header="{}" footer="{}"/>"#,
            m.left, m.right, m.top, m.bottom, m.header, m.footer
        ));
        xml.push_str(&format!(
            r#"<pageSetup paperSize="{}" orientation="{}""#,
            setup.paper_size.0,
            setup.orientation.as_xlsx_str()
        ));
        if let Some(w) = setup.fit_to_width {
            xml.push_str(&format!(r#" fitToWidth="{w}""#));
        }
        if let Some(h) = setup.fit_to_height {
            xml.push_str(&format!(r#" fitToHeight="{h}""#));
        }
        xml.push_str("/>");
    }

    xml.push_str("</worksheet>");
    xml
}

fn sheet_data_xml(sheet: &Worksheet, shared_lookup: &HashMap<String, u32>) -> String {
    let mut out = String::new();
    out.push_str("<sheetData>");

    // Rows appear if they hold cells or carry an explicit height.
    let mut row_indexes: BTreeSet<u32> = sheet.iter_cells().map(|(r, _)| r.row).collect();
    row_indexes.extend(sheet.row_heights.keys().copied());

    for row in row_indexes {
        out.push_str(&format!(r#"<row r="{}""#, row + 1));
        if let Some(height) = sheet.row_heights.get(&row) {
            out.push_str(&format!(r#" ht="{height}" customHeight="1""#));
        }

        let cells: Vec<_> = sheet
            .iter_cells()
            .filter(|(r, _)| r.row == row)
            .collect();
        if cells.is_empty() {
            out.push_str("/>");
            continue;
        }
        out.push('>');

        for (cell_ref, cell) in cells {
            out.push_str(&format!(r#"<c r="{}""#, cell_ref.to_a1()));
            if cell.style_id != 0 {
                out.push_str(&format!(r#" s="{}""#, cell.style_id));
            }
            match &cell.value {
                CellValue::String(_) => out.push_str(r#" t="s""#),
                CellValue::Boolean(_) => out.push_str(r#" t="b""#),
                CellValue::Number(_) | CellValue::Empty => {}
            }
            out.push('>');

            if let Some(formula) = &cell.formula {
                out.push_str("<f>");
                out.push_str(&escape_text(formula));
                out.push_str("</f>");
            }

            match &cell.value {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    out.push_str(&format!("<v>{}</v>", format_number(*n)));
                }
                CellValue::Boolean(b) => {
                    out.push_str(if *b { "<v>1</v>" } else { "<v>0</v>" });
                }
                CellValue::String(s) => {
                    let idx = shared_lookup
                        .get(s)
                        .copied()
                        .expect("every string value was collected into the shared table");
                    out.push_str(&format!("<v>{idx}</v>"));
                }
            }
            out.push_str("</c>");
        }
        out.push_str("</row>");
    }

    out.push_str("</sheetData>");
    out
}
