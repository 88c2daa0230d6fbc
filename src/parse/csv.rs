use crate::model::BugRecord;
use crate::parse::table::RawTable;
use std::mem::take;

/// Quote-aware CSV splitter, tolerant of CRLF and unterminated quotes.
/// Cells are trimmed; blank lines are skipped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field).trim().to_string()),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field).trim().to_string());
                flush_row(&mut rows, &mut row);
            }
            _ => field.push(ch),
        }
    }

    row.push(field.trim().to_string());
    flush_row(&mut rows, &mut row);
    rows
}

fn flush_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>) {
    if row.len() == 1 && row[0].is_empty() {
        row.clear();
    } else {
        rows.push(take(row));
    }
}

/// Status x grouping-value export: header row names the groups, each data
/// row starts with a status label. Rows not matching the header width are skipped.
pub fn csv_table(text: &str) -> RawTable {
    let raw = RawTable::from_status_grid(parse_rows(text));
    let width = raw.headers.len();
    let (rows, skipped): (Vec<_>, Vec<_>) = raw.rows.into_iter().partition(|row| row.len() == width);
    if !skipped.is_empty() {
        tracing::debug!(skipped = skipped.len(), width, "skipped CSV rows with a mismatched width");
    }
    RawTable::new(raw.headers, rows)
}

/// One record per bug of a bug-list export. Header only or empty input yields none.
pub fn csv_records(text: &str) -> Vec<BugRecord> {
    let mut grid = parse_rows(text);
    if grid.len() <= 1 {
        return vec![];
    }
    let headers = grid.remove(0);
    RawTable::new(headers, grid).records()
}
