//! Tabular region detection in free text

use crate::types::{Table, TableRow};
use regex::Regex;

/// A run of tabs, or three or more whitespace characters
static CELL_SEPARATOR: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\t+|\s{3,}").unwrap());

/// Minimum cells for a line to count as a table row
pub const MIN_CELLS: usize = 2;

/// Minimum consecutive table-like lines (header included) for a table
pub const MIN_ROWS: usize = 2;

/// Split a line into trimmed, non-empty cells
#[must_use]
pub fn split_cells(line: &str) -> Vec<String> {
    CELL_SEPARATOR
        .split(line)
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Find delimiter-aligned tables in `text`, in document order.
///
/// Blank lines are ignored entirely, so a table may span them. Any other line
/// with fewer than [`MIN_CELLS`] cells ends the current block. A lone aligned
/// line is treated as accidental and dropped.
#[must_use]
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();

    for line in text.split('\n').filter(|l| !l.trim().is_empty()) {
        let cells = split_cells(line);
        if cells.len() >= MIN_CELLS {
            block.push(cells);
        } else {
            close_block(&mut block, &mut tables);
        }
    }

    close_block(&mut block, &mut tables);
    tables
}

fn close_block(block: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if block.len() >= MIN_ROWS {
        let mut rows = std::mem::take(block).into_iter();
        let headers = rows.next();
        tables.push(Table {
            range: None,
            headers,
            rows: rows.map(TableRow::Cells).collect(),
        });
    } else {
        block.clear();
    }
}
