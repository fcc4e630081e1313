//! Section-delimited text rendering of an evidence pack
//!
//! The layout is consumed verbatim by the extraction prompt, so changes here
//! change every prompt built from a pack.

use crate::config::EvidenceConfig;
use crate::types::{EvidencePack, Table, TableRow, display_value};

/// Render a pack as evidence text.
///
/// Email segments come first, then each PDF page by page, then each
/// spreadsheet sheet by sheet. Rows per table are capped at
/// `config.max_rows_per_table`.
#[must_use]
pub fn render_evidence(pack: &EvidencePack, config: &EvidenceConfig) -> String {
    let mut parts: Vec<String> = Vec::new();
    let max_rows = config.max_rows_per_table;

    if !pack.email.segments.is_empty() {
        parts.push("=== EMAIL BODY ===".into());
        for (i, segment) in pack.email.segments.iter().enumerate() {
            parts.push(format!("[Segment {i} | type: {}]", segment.kind));
            parts.push(segment.content.clone());
            if let Some(from) = &segment.from {
                parts.push(format!("  From: {from}"));
            }
            if let Some(date) = &segment.date {
                parts.push(format!("  Date: {date}"));
            }
            parts.push(String::new());
        }
    }

    for pdf in &pack.pdfs {
        parts.push(format!("=== PDF: {} ===", pdf.filename));
        for page in &pdf.pages {
            parts.push(format!("[Page {}]", page.page_number));
            parts.push(page.text.clone());
            for (ti, table) in page.tables.iter().enumerate() {
                parts.push(format!("  [Table {ti}]"));
                if let Some(headers) = &table.headers {
                    parts.push(format!("  Headers: {}", headers.join(" | ")));
                }
                for row in table.rows.iter().take(max_rows) {
                    parts.push(format!("  {}", row.values(None).join(" | ")));
                }
            }
            parts.push(String::new());
        }
    }

    for excel in &pack.excels {
        parts.push(format!("=== EXCEL: {} ===", excel.filename));
        for sheet in &excel.sheets {
            parts.push(format!("[Sheet: {}]", sheet.name));
            for table in &sheet.tables {
                render_sheet_table(table, max_rows, &mut parts);
            }
            parts.push(String::new());
        }
    }

    parts.join("\n")
}

fn render_sheet_table(table: &Table, max_rows: usize, parts: &mut Vec<String>) {
    let headers = table.headers.as_deref().unwrap_or_default();
    parts.push(format!("  Headers: {}", headers.join(" | ")));

    for row in table.rows.iter().take(max_rows) {
        let line = match row {
            TableRow::Record(record) => headers
                .iter()
                .map(|h| {
                    let value = record.get(h).map(display_value).unwrap_or_default();
                    format!("{h}: {value}")
                })
                .collect::<Vec<_>>()
                .join(" | "),
            TableRow::Cells(cells) => cells.join(" | "),
        };
        parts.push(format!("  {line}"));
    }
}
