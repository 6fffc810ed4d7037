use std::collections::HashMap;
use std::path::Path;

use paysheet_model::{CellRef, CellValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::{ArchiveError, WorkbookArchive};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Errors raised while loading a source workbook.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("part {part} is not valid UTF-8")]
    Utf8 { part: String },
    #[error("missing required workbook part: {0}")]
    MissingPart(String),
    #[error("worksheet '{sheet}' has no part for relationship id '{rel_id}'")]
    MissingSheetTarget { sheet: String, rel_id: String },
    #[error("invalid cell reference '{0}' in worksheet xml")]
    InvalidCellRef(String),
    #[error("shared string index {0} out of range")]
    SharedStringIndex(usize),
    #[error("malformed shared string reference '{0}'")]
    BadSharedStringRef(String),
}

/// One loaded worksheet: a dense row/column table of raw cell values.
///
/// Rows and columns are 0-indexed; gaps are [`CellValue::Empty`]. Only cached
/// values are loaded; formulas in source cells are ignored.
#[derive(Debug, Clone)]
pub struct SourceSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SourceSheet {
    /// The value at `(row, col)`, [`CellValue::Empty`] when out of bounds.
    pub fn value(&self, row: usize, col: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// All worksheets of a loaded source workbook, in tab order.
#[derive(Debug, Clone)]
pub struct SourceWorkbook {
    pub sheets: Vec<SourceSheet>,
}

impl SourceWorkbook {
    /// Find a sheet by name (case-insensitive, like Excel tab lookup).
    pub fn sheet(&self, name: &str) -> Option<&SourceSheet> {
        let wanted = name.trim().to_lowercase();
        self.sheets
            .iter()
            .find(|s| s.name.trim().to_lowercase() == wanted)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Load a source workbook from a file.
pub fn read_from_path(path: &Path) -> Result<SourceWorkbook, ReadError> {
    let archive = WorkbookArchive::open(path)?;
    read_archive(&archive)
}

/// Load a source workbook from raw `.xlsx`/`.xlsm` bytes.
pub fn read_from_bytes(bytes: &[u8]) -> Result<SourceWorkbook, ReadError> {
    let archive = WorkbookArchive::from_bytes(bytes)?;
    read_archive(&archive)
}

fn read_archive(archive: &WorkbookArchive) -> Result<SourceWorkbook, ReadError> {
    let shared = match archive.get(SHARED_STRINGS_PART) {
        Some(bytes) => parse_shared_strings(part_str(SHARED_STRINGS_PART, bytes)?)?,
        None => Vec::new(),
    };

    let workbook_xml = archive
        .get(WORKBOOK_PART)
        .ok_or_else(|| ReadError::MissingPart(WORKBOOK_PART.to_string()))?;
    let sheet_entries = parse_sheet_entries(part_str(WORKBOOK_PART, workbook_xml)?)?;

    let rels_xml = archive
        .get(WORKBOOK_RELS_PART)
        .ok_or_else(|| ReadError::MissingPart(WORKBOOK_RELS_PART.to_string()))?;
    let rel_targets = parse_relationship_targets(part_str(WORKBOOK_RELS_PART, rels_xml)?)?;

    let mut sheets = Vec::with_capacity(sheet_entries.len());
    for (name, rel_id) in sheet_entries {
        let target = rel_targets
            .get(&rel_id)
            .ok_or_else(|| ReadError::MissingSheetTarget {
                sheet: name.clone(),
                rel_id: rel_id.clone(),
            })?;
        let part = resolve_target(target);
        let sheet_xml = archive
            .get(&part)
            .ok_or_else(|| ReadError::MissingPart(part.clone()))?;
        let rows = parse_sheet_data(part_str(&part, sheet_xml)?, &shared)?;
        sheets.push(SourceSheet { name, rows });
    }

    Ok(SourceWorkbook { sheets })
}

fn part_str<'a>(part: &str, bytes: &'a [u8]) -> Result<&'a str, ReadError> {
    let s = std::str::from_utf8(bytes).map_err(|_| ReadError::Utf8 {
        part: part.to_string(),
    })?;
    // Some producers prepend a UTF-8 BOM; the XML parser does not want it.
    Ok(s.trim_start_matches('\u{feff}'))
}

/// Relationship targets are relative to `xl/` unless they start with `/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, ReadError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parse `xl/workbook.xml` into `(sheet name, relationship id)` pairs in tab
/// order.
fn parse_sheet_entries(xml: &str) -> Result<Vec<(String, String)>, ReadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut entries = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name")?.unwrap_or_default();
                let rel_id = attr_value(&e, b"r:id")?.unwrap_or_default();
                entries.push((name, rel_id));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

/// Parse `xl/_rels/workbook.xml.rels` into relationship id → target.
fn parse_relationship_targets(xml: &str) -> Result<HashMap<String, String>, ReadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attr_value(&e, b"Id")?, attr_value(&e, b"Target")?)
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Parse `xl/sharedStrings.xml` into a flat string table.
///
/// Rich-text runs are flattened to their concatenated visible text; phonetic
/// guide runs (`<rPh>`) are skipped because their `<t>` nodes are not part of
/// the displayed string.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, ReadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut table = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                current = Some(String::new());
            }
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"t" && current.is_some() => {
                in_text = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"t" => {
                in_text = false;
            }
            Event::Text(e) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&e.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"si" => {
                table.push(current.take().unwrap_or_default());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(table)
}

/// What a `<c>` element declared about its value via the `t` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Number,
    SharedString,
    InlineString,
    Str,
    Bool,
    Error,
}

impl CellType {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => CellType::SharedString,
            Some("inlineStr") => CellType::InlineString,
            Some("str") => CellType::Str,
            Some("b") => CellType::Bool,
            Some("e") => CellType::Error,
            _ => CellType::Number,
        }
    }
}

struct PendingCell {
    row: u32,
    col: u32,
    ty: CellType,
    value: String,
    inline: String,
}

/// Parse a worksheet part's `sheetData` into dense rows.
fn parse_sheet_data(xml: &str, shared: &[String]) -> Result<Vec<Vec<CellValue>>, ReadError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    // Running coordinates for cells that omit the `r` attribute.
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                if let Some(r) = attr_value(&e, b"r")? {
                    let row_1_based: u32 = r
                        .parse()
                        .map_err(|_| ReadError::InvalidCellRef(r.clone()))?;
                    next_row = row_1_based.saturating_sub(1);
                } // else: rows without `r` continue from the previous row
                next_col = 0;
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                next_row += 1;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let (row, col) = match attr_value(&e, b"r")? {
                    Some(a1) => {
                        let cell = CellRef::from_a1(&a1)
                            .map_err(|_| ReadError::InvalidCellRef(a1.clone()))?;
                        (cell.row, cell.col)
                    }
                    None => (next_row, next_col),
                };
                let t = attr_value(&e, b"t")?;
                pending = Some(PendingCell {
                    row,
                    col,
                    ty: CellType::from_attr(t.as_deref()),
                    value: String::new(),
                    inline: String::new(),
                });
                next_col = col + 1;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                // A self-closing cell carries no value; only advance the cursor.
                if let Some(a1) = attr_value(&e, b"r")? {
                    let cell = CellRef::from_a1(&a1)
                        .map_err(|_| ReadError::InvalidCellRef(a1.clone()))?;
                    next_col = cell.col + 1;
                } else {
                    next_col += 1;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => {
                if let Some(cell) = pending.take() {
                    let value = finish_cell(&cell, shared)?;
                    if value != CellValue::Empty {
                        set_dense(&mut rows, cell.row as usize, cell.col as usize, value);
                    }
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                in_value = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"v" => {
                in_value = false;
            }
            Event::Start(e) if e.local_name().as_ref() == b"t" && pending.is_some() => {
                in_inline_text = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"t" => {
                in_inline_text = false;
            }
            Event::Start(e) if e.local_name().as_ref() == b"f" => {
                // Source formulas are not loaded; skip to the cached value.
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }
            Event::Text(e) => {
                if let Some(cell) = pending.as_mut() {
                    if in_value {
                        cell.value.push_str(&e.unescape()?);
                    } else if in_inline_text {
                        cell.inline.push_str(&e.unescape()?);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn finish_cell(cell: &PendingCell, shared: &[String]) -> Result<CellValue, ReadError> {
    Ok(match cell.ty {
        CellType::SharedString => {
            let idx: usize = cell
                .value
                .trim()
                .parse()
                .map_err(|_| ReadError::BadSharedStringRef(cell.value.clone()))?;
            let text = shared
                .get(idx)
                .ok_or(ReadError::SharedStringIndex(idx))?;
            CellValue::String(text.clone())
        }
        CellType::InlineString => CellValue::String(cell.inline.clone()),
        CellType::Str | CellType::Error => {
            if cell.value.is_empty() {
                CellValue::Empty
            } else {
                CellValue::String(cell.value.clone())
            }
        }
        CellType::Bool => CellValue::Boolean(cell.value.trim() == "1"),
        CellType::Number => {
            let raw = cell.value.trim();
            if raw.is_empty() {
                CellValue::Empty
            } else {
                match raw.parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    // Malformed numeric text is kept as text; downstream
                    // validation flags it rather than dropping the cell.
                    Err(_) => CellValue::String(raw.to_string()),
                }
            }
        }
    })
}

fn set_dense(rows: &mut Vec<Vec<CellValue>>, row: usize, col: usize, value: CellValue) {
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let r = &mut rows[row];
    if r.len() <= col {
        r.resize(col + 1, CellValue::Empty);
    }
    r[col] = value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_data_types_resolve() {
        let shared = vec!["widget".to_string()];
        let xml = r#"<?xml version="1.0"?>
<worksheet><sheetData>
  <row r="1">
    <c r="A1" t="s"><v>0</v></c>
    <c r="B1"><v>12.5</v></c>
    <c r="C1" t="inlineStr"><is><t>ad hoc</t></is></c>
    <c r="D1" t="b"><v>1</v></c>
  </row>
  <row r="3">
    <c r="B3" t="str"><v>=cached</v></c>
  </row>
</sheetData></worksheet>"#;
        let rows = parse_sheet_data(xml, &shared).unwrap();
        assert_eq!(rows[0][0], CellValue::String("widget".into()));
        assert_eq!(rows[0][1], CellValue::Number(12.5));
        assert_eq!(rows[0][2], CellValue::String("ad hoc".into()));
        assert_eq!(rows[0][3], CellValue::Boolean(true));
        // Row 2 is a gap; row 3 column A is a gap.
        assert!(rows[1].is_empty());
        assert_eq!(rows[2][0], CellValue::Empty);
        assert_eq!(rows[2][1], CellValue::String("=cached".into()));
    }

    #[test]
    fn cells_without_refs_advance_in_order() {
        let xml = r#"<worksheet><sheetData>
  <row><c><v>1</v></c><c><v>2</v></c></row>
  <row><c><v>3</v></c></row>
</sheetData></worksheet>"#;
        let rows = parse_sheet_data(xml, &[]).unwrap();
        assert_eq!(rows[0], vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
        assert_eq!(rows[1], vec![CellValue::Number(3.0)]);
    }

    #[test]
    fn formula_cells_use_cached_value() {
        let xml = r#"<worksheet><sheetData>
  <row r="1"><c r="A1"><f>B1*2</f><v>10</v></c></row>
</sheetData></worksheet>"#;
        let rows = parse_sheet_data(xml, &[]).unwrap();
        assert_eq!(rows[0][0], CellValue::Number(10.0));
    }

    #[test]
    fn shared_strings_flatten_rich_runs() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
  <si><t>plain</t></si>
  <si><r><t>ri</t></r><r><rPr><b/></rPr><t>ch</t></r></si>
</sst>"#;
        let table = parse_shared_strings(xml).unwrap();
        assert_eq!(table, vec!["plain".to_string(), "rich".to_string()]);
    }

    #[test]
    fn out_of_range_shared_string_is_an_error() {
        let xml = r#"<worksheet><sheetData>
  <row r="1"><c r="A1" t="s"><v>7</v></c></row>
</sheetData></worksheet>"#;
        let err = parse_sheet_data(xml, &[]).unwrap_err();
        assert!(matches!(err, ReadError::SharedStringIndex(7)));
    }
}
