//! Workbook sheets to header-keyed tables

use crate::error::Result;
use crate::types::{
    AttachmentMeta, ExcelEvidence, ExcelSheetEvidence, Record, SheetLayout, Table, TableRow,
    display_value,
};
use calamine::{Data, Reader};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::debug;

/// Header used for blank header cells
const EMPTY_HEADER: &str = "__EMPTY";

/// Occupied cells of one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub name: String,

    /// Zero-based (row, column) of the top-left occupied cell
    pub origin: (u32, u32),

    /// Cell values row by row; blank cells are empty strings
    pub rows: Vec<Vec<Value>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            origin: (0, 0),
            rows,
        }
    }

    /// Used range in A1 notation, `None` for an empty sheet
    #[must_use]
    pub fn range(&self) -> Option<String> {
        let height = u32::try_from(self.rows.len()).ok()?;
        let width = u32::try_from(self.rows.iter().map(Vec::len).max()?).ok()?;
        if height == 0 || width == 0 {
            return None;
        }

        let (row, col) = self.origin;
        Some(format!(
            "{}{}:{}{}",
            column_name(col),
            row + 1,
            column_name(col + width - 1),
            row + height
        ))
    }
}

/// Spreadsheet column letters for a zero-based index (0 → `A`, 26 → `AA`)
#[must_use]
pub fn column_name(index: u32) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

/// Backend that decodes workbook bytes into sheet grids
pub trait WorkbookDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<SheetGrid>>;
}

/// Default backend built on `calamine` (xlsx, xls, xlsb, ods)
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineDecoder;

impl WorkbookDecoder for CalamineDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<SheetGrid>> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let origin = range.start().unwrap_or((0, 0));
            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_value).collect())
                .collect();
            sheets.push(SheetGrid { name, origin, rows });
        }

        Ok(sheets)
    }
}

#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) if f.trunc() == *f && f.abs() < 1e15 => Value::from(*f as i64),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map_or_else(|| Value::String(f.to_string()), Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map_or_else(
            || Value::String(cell.to_string()),
            |d| Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()),
        ),
        other => Value::String(other.to_string()),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Header names for the first row: blank cells become `__EMPTY` and repeated
/// names get `_1`, `_2`, ... suffixes
#[must_use]
pub fn unique_headers(cells: &[Value]) -> Vec<String> {
    let mut used = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    cells
        .iter()
        .map(|cell| {
            let base = match display_value(cell).trim() {
                "" => EMPTY_HEADER.to_string(),
                name => name.to_string(),
            };

            let mut name = base.clone();
            while used.contains(&name) {
                let counter = counters.entry(base.clone()).or_insert(0);
                *counter += 1;
                name = format!("{base}_{counter}");
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Turn one sheet into evidence: a single table spanning the used range,
/// first row as headers, every record carrying every header
#[must_use]
pub fn extract_sheet(grid: &SheetGrid, sample_rows: usize) -> ExcelSheetEvidence {
    let mut rows = grid.rows.iter();
    let header_cells = rows.next().map(Vec::as_slice).unwrap_or_default();
    let candidate_headers = unique_headers(header_cells);

    let records: Vec<Record> = rows
        .filter(|row| !row.iter().all(is_blank))
        .map(|row| {
            candidate_headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = row
                        .get(i)
                        .filter(|v| !v.is_null())
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    (header.clone(), value)
                })
                .collect()
        })
        .collect();

    let headers = if records.is_empty() {
        Vec::new()
    } else {
        candidate_headers
    };

    let layout = detect_layout(&headers, &records);
    let cells_sample = records.iter().take(sample_rows).cloned().collect();

    ExcelSheetEvidence {
        name: grid.name.clone(),
        tables: vec![Table {
            range: grid.range(),
            headers: Some(headers),
            rows: records.into_iter().map(TableRow::Record).collect(),
        }],
        cells_sample: Some(cells_sample),
        layout,
    }
}

/// Two columns whose first column is all text reads as a label/value sheet
#[must_use]
pub fn detect_layout(headers: &[String], records: &[Record]) -> SheetLayout {
    let key_value = headers.len() == 2
        && !records.is_empty()
        && records
            .iter()
            .all(|r| matches!(r.get(&headers[0]), Some(Value::String(_))));

    if key_value {
        SheetLayout::KeyValue
    } else {
        SheetLayout::Tabular
    }
}

/// Parse one spreadsheet attachment into evidence
pub fn parse_spreadsheet(
    decoder: &dyn WorkbookDecoder,
    meta: &AttachmentMeta,
    bytes: &[u8],
    sample_rows: usize,
) -> Result<ExcelEvidence> {
    let sheets: Vec<ExcelSheetEvidence> = decoder
        .decode(bytes)?
        .iter()
        .map(|grid| extract_sheet(grid, sample_rows))
        .collect();

    debug!(
        filename = %meta.filename,
        sheets = sheets.len(),
        rows = sheets
            .iter()
            .flat_map(|s| &s.tables)
            .map(Table::row_count)
            .sum::<usize>(),
        "Parsed spreadsheet"
    );

    Ok(ExcelEvidence {
        attachment_id: meta.id,
        filename: meta.filename.clone(),
        sheets,
    })
}
