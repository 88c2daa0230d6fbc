use crate::model::{BugRecord, TOTAL_LABEL};
use indexmap::IndexMap;
use serde::Serialize;

pub const STATUS_HEADER: &str = "Status";

/// Grid of trimmed cell text: one header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// New
impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Splits a grid into header and rows, relabeling the first header `Status`.
    pub fn from_status_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let mut headers = grid.remove(0);
        if let Some(first) = headers.first_mut() {
            *first = STATUS_HEADER.to_string();
        }
        Self::new(headers, grid)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drops columns whose data cells are all empty. The label column always stays.
    pub fn drop_empty_columns(mut self) -> Self {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        let keep = (0..width)
            .map(|col| {
                col == 0
                    || self
                        .rows
                        .iter()
                        .any(|row| row.get(col).is_some_and(|cell| !cell.trim().is_empty()))
            })
            .collect::<Vec<_>>();
        let retain = |cells: Vec<String>| {
            cells
                .into_iter()
                .enumerate()
                .filter(|(col, _)| keep.get(*col).copied().unwrap_or(false))
                .map(|(_, cell)| cell)
                .collect::<Vec<_>>()
        };
        self.headers = retain(self.headers);
        self.rows = self.rows.into_iter().map(retain).collect();
        self
    }

    /// Every row as a header-keyed record; rows of the wrong width are skipped.
    pub fn records(&self) -> Vec<BugRecord> {
        self.rows
            .iter()
            .filter(|row| row.len() == self.headers.len())
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<BugRecord>()
            })
            .collect()
    }
}

/// Status label -> grouping value -> count, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedTable {
    rows: IndexMap<String, IndexMap<String, u64>>,
}

// New
impl NormalizedTable {
    /// The first column labels each row; every other column is a grouping value.
    pub fn from_raw(raw: &RawTable) -> Self {
        let groups = raw.headers.iter().skip(1).collect::<Vec<_>>();
        let mut rows: IndexMap<String, IndexMap<String, u64>> = IndexMap::new();
        for row in &raw.rows {
            let Some(label) = row.first() else {
                continue;
            };
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            let cells = rows.entry(label.to_string()).or_default();
            for (index, group) in groups.iter().enumerate() {
                let value = row.get(index + 1).map(|cell| coerce_count(cell)).unwrap_or(0);
                cells.insert(group.to_string(), value);
            }
        }
        Self { rows }
    }
}

// Access
impl NormalizedTable {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Grouping values in column order, the aggregate `Total` column included.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = vec![];
        for cells in self.rows.values() {
            for group in cells.keys() {
                if !groups.contains(&group.as_str()) {
                    groups.push(group);
                }
            }
        }
        groups
    }

    pub fn get(&self, label: &str, group: &str) -> Option<u64> {
        self.rows.get(label)?.get(group).copied()
    }

    pub fn row(&self, label: &str) -> Option<&IndexMap<String, u64>> {
        self.rows.get(label)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &IndexMap<String, u64>)> {
        self.rows.iter().map(|(label, cells)| (label.as_str(), cells))
    }

    /// Grouping value -> label -> count, without the aggregate row and column.
    pub fn by_group(&self) -> IndexMap<String, IndexMap<String, u64>> {
        let mut out: IndexMap<String, IndexMap<String, u64>> = IndexMap::new();
        for group in self.groups().into_iter().filter(|g| *g != TOTAL_LABEL) {
            let column = out.entry(group.to_string()).or_default();
            for (label, cells) in self.rows().filter(|(label, _)| *label != TOTAL_LABEL) {
                column.insert(label.to_string(), cells.get(group).copied().unwrap_or(0));
            }
        }
        out
    }
}

/// Coerces one cell to a count. Placeholders (`.`), blanks and anything
/// unparsable become 0; decimals are truncated; negatives clamp to 0.
pub fn coerce_count(cell: &str) -> u64 {
    let cell = cell.trim().trim_matches('"').trim();
    if cell.is_empty() || cell == "." {
        return 0;
    }
    if let Ok(value) = cell.parse::<u64>() {
        return value;
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => {
            tracing::debug!(cell = %cell, "non-numeric cell coerced to 0");
            0
        }
    }
}

/// Parses a count without coercion, for cells whose absence matters.
pub fn parse_count(cell: &str) -> Option<u64> {
    let cell = cell.trim().trim_matches('"').trim();
    if let Ok(value) = cell.parse::<u64>() {
        return Some(value);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value.trunc() as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn placeholders_and_garbage_become_zero() {
        for cell in [".", " . ", "", "N/A", "₹1,200", "abc", "-4", "NaN", "inf"] {
            assert_eq!(coerce_count(cell), 0, "cell {cell:?}");
        }
        assert_eq!(coerce_count(" 7 "), 7);
        assert_eq!(coerce_count("\"12\""), 12);
        assert_eq!(coerce_count("3.0"), 3);
        assert_eq!(coerce_count("2.9"), 2);
    }

    #[test]
    fn parse_count_rejects_placeholders() {
        assert_eq!(parse_count("."), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count(" 15 "), Some(15));
    }

    #[test]
    fn first_header_is_relabeled_status() {
        let raw = RawTable::from_status_grid(vec![
            strings(&["Version / Status", "OS"]),
            strings(&["UNCONFIRMED", "1"]),
        ]);
        assert_eq!(raw.headers, strings(&["Status", "OS"]));
        assert_eq!(raw.rows.len(), 1);
    }

    #[test]
    fn empty_columns_are_dropped() {
        let raw = RawTable::new(
            strings(&["Status", "OS", "", "Web"]),
            vec![
                strings(&["UNCONFIRMED", "1", "", "2"]),
                strings(&["CONFIRMED", ".", " ", "4"]),
            ],
        )
        .drop_empty_columns();
        assert_eq!(raw.headers, strings(&["Status", "OS", "Web"]));
        assert_eq!(raw.rows[1], strings(&["CONFIRMED", ".", "4"]));
    }

    #[test]
    fn unknown_status_rows_are_kept_verbatim() {
        let raw = RawTable::new(
            strings(&["Status", "OS"]),
            vec![strings(&["VERIFIED", "2"]), strings(&["UNCONFIRMED", "x"])],
        );
        let table = NormalizedTable::from_raw(&raw);
        assert_eq!(table.get("VERIFIED", "OS"), Some(2));
        assert_eq!(table.get("UNCONFIRMED", "OS"), Some(0));
        assert_eq!(table.labels().collect::<Vec<_>>(), vec!["VERIFIED", "UNCONFIRMED"]);
    }

    #[test]
    fn short_rows_fill_missing_cells_with_zero() {
        let raw = RawTable::new(strings(&["Status", "OS", "Web"]), vec![strings(&["CONFIRMED", "5"])]);
        let table = NormalizedTable::from_raw(&raw);
        assert_eq!(table.get("CONFIRMED", "Web"), Some(0));
    }

    #[test]
    fn records_skip_rows_of_wrong_width() {
        let raw = RawTable::new(
            strings(&["bug_id", "component"]),
            vec![strings(&["1", "API"]), strings(&["2"]), strings(&["3", "UI"])],
        );
        let records = raw.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["component"], "UI");
    }
}
