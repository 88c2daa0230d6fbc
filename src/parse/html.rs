// Low-level HTML scanning for the tracker's report and login pages.
// Case-insensitive on ASCII tag and attribute names; no DOM is built.

use crate::error::{Error, Result};
use crate::model::BugStatus;
use crate::parse::table::RawTable;
use indexmap::IndexMap;

/// Span of one complete `<table>...</table>` block, nesting aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    start: usize,
    end: usize,
}

impl Block {
    fn contains(&self, other: &Block) -> bool {
        self != other && self.start <= other.start && other.end <= self.end
    }
}

/// Finds the table holding the status counts: the innermost table whose text
/// contains at least two known status labels as substrings.
pub fn find_status_table(html: &str) -> Result<&str> {
    let blocks = table_blocks(html);
    let qualifying = blocks
        .iter()
        .filter(|block| mentions_statuses(&html[block.start..block.end]))
        .collect::<Vec<_>>();
    let table = qualifying
        .iter()
        .find(|block| !qualifying.iter().any(|inner| block.contains(inner)))
        .ok_or_else(|| {
            tracing::debug!(tables = blocks.len(), "no table mentions the bug statuses");
            Error::TableNotFound
        })?;
    Ok(&html[table.start..table.end])
}

/// Status x grouping-value table of an HTML report page.
pub fn status_table(html: &str) -> Result<RawTable> {
    let block = find_status_table(html)?;
    Ok(RawTable::from_status_grid(table_grid(block)).drop_empty_columns())
}

/// First table of the page whose header row has the given column, as a plain grid.
pub fn table_with_column(html: &str, column: &str) -> Result<RawTable> {
    for block in table_blocks(html) {
        let mut grid = table_grid(&html[block.start..block.end]);
        if grid.is_empty() {
            continue;
        }
        let headers = grid.remove(0);
        if headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            return Ok(RawTable::new(headers, grid));
        }
    }
    Err(Error::TableNotFound)
}

fn mentions_statuses(block: &str) -> bool {
    let text = strip_tags(block);
    BugStatus::ALL
        .iter()
        .filter(|status| text.contains(status.label()))
        .count()
        >= 2
}

fn table_blocks(html: &str) -> Vec<Block> {
    let lc = to_lowercase_fast(html);
    let mut blocks = vec![];
    let mut open = vec![];
    let mut pos = 0;
    while pos < lc.len() {
        let next_open = find_tag(&lc, "<table", pos);
        let next_close = find_tag(&lc, "</table", pos);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                open.push(o);
                pos = o + 1;
            }
            (_, Some(c)) => {
                let end = lc[c..].find('>').map(|i| c + i + 1).unwrap_or(lc.len());
                if let Some(start) = open.pop() {
                    blocks.push(Block { start, end });
                }
                pos = end;
            }
            (Some(o), None) => {
                open.push(o);
                pos = o + 1;
            }
            (None, None) => break,
        }
    }
    blocks.sort_by_key(|block| block.start);
    blocks
}

/// Rows of a table block as tag-stripped, trimmed cell text.
fn table_grid(block: &str) -> Vec<Vec<String>> {
    let lc = to_lowercase_fast(block);
    let inner_start = block.find('>').map(|i| i + 1).unwrap_or(0);
    let mut rows = vec![];
    let mut pos = inner_start;
    while let Some(row_start) = find_tag(&lc, "<tr", pos) {
        let row_end = [find_tag(&lc, "</tr", row_start), find_tag(&lc, "<tr", row_start + 3)]
            .into_iter()
            .flatten()
            .min()
            .or_else(|| find_tag(&lc, "</table", row_start))
            .unwrap_or(block.len());
        let cells = row_cells(&block[row_start..row_end], &lc[row_start..row_end]);
        if !cells.is_empty() {
            rows.push(cells);
        }
        pos = row_end.max(row_start + 3);
    }
    rows
}

fn row_cells(row: &str, row_lc: &str) -> Vec<String> {
    let mut cells = vec![];
    let mut pos = 0;
    loop {
        let start = match (find_tag(row_lc, "<td", pos), find_tag(row_lc, "<th", pos)) {
            (Some(td), Some(th)) => td.min(th),
            (Some(td), None) => td,
            (None, Some(th)) => th,
            (None, None) => break,
        };
        let Some(open_end) = row[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let end = [
            find_tag(row_lc, "</td", open_end),
            find_tag(row_lc, "</th", open_end),
            find_tag(row_lc, "<td", open_end),
            find_tag(row_lc, "<th", open_end),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(row.len());
        cells.push(normalize_ws(&normalize_entities(&strip_tags(&row[open_end..end]))));
        pos = end;
    }
    cells
}

/// Attributes of every `<input>` tag, attribute names lowercased.
pub fn input_tags(html: &str) -> Vec<IndexMap<String, String>> {
    let lc = to_lowercase_fast(html);
    let mut tags = vec![];
    let mut pos = 0;
    while let Some(start) = find_tag(&lc, "<input", pos) {
        let end = html[start..].find('>').map(|i| start + i).unwrap_or(html.len());
        tags.push(tag_attributes(&html[start + "<input".len()..end]));
        pos = end;
    }
    tags
}

/// Parses `a="x" b='y' c=z d` into a map; valueless attributes map to "".
pub fn tag_attributes(attrs: &str) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let mut chars = attrs.trim_end_matches('/').chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == '/').is_some() {}
        let name: String = std::iter::from_fn(|| {
            chars.next_if(|c| !c.is_whitespace() && *c != '=' && *c != '/')
        })
        .collect();
        if name.is_empty() {
            break;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            match chars.peek().copied() {
                Some(quote @ ('"' | '\'')) => {
                    chars.next();
                    value = std::iter::from_fn(|| chars.next_if(|c| *c != quote)).collect();
                    chars.next();
                }
                _ => {
                    value = std::iter::from_fn(|| chars.next_if(|c| !c.is_whitespace())).collect();
                }
            }
        }
        out.insert(name.to_ascii_lowercase(), normalize_entities(&value));
    }
    out
}

/// Position of `<tag` (or `</tag`) followed by whitespace, `>` or `/`.
fn find_tag(lc: &str, tag: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(rel) = lc.get(pos..)?.find(tag) {
        let at = pos + rel;
        match lc[at + tag.len()..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(at),
            None => return Some(at),
            _ => pos = at + tag.len(),
        }
    }
    None
}

/// Remove all HTML tags `<...>` from the string, then collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&out)
}

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse sequences of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// ASCII-only lowercasing; byte offsets stay valid against the input.
pub fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}
