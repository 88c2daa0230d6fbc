pub mod csv;
pub mod html;
pub mod table;

pub use table::{coerce_count, parse_count, NormalizedTable, RawTable};

use crate::error::{Error, Result};
use crate::model::{BugRecord, ReportFormat};

/// Status x grouping-value grid of a report body, HTML or CSV.
pub fn status_table(body: &str, format: ReportFormat) -> Result<RawTable> {
    let raw = match format {
        ReportFormat::HtmlTable => html::status_table(body)?,
        ReportFormat::Csv if looks_like_html(body) => return Err(Error::TableNotFound),
        ReportFormat::Csv => csv::csv_table(body),
    };
    if raw.headers.len() < 2 {
        return Err(Error::TableNotFound);
    }
    Ok(raw)
}

/// Bug records of a bug-list body. An empty list is not an error.
pub fn bug_records(body: &str, format: ReportFormat) -> Result<Vec<BugRecord>> {
    match format {
        ReportFormat::Csv if looks_like_html(body) => Err(Error::TableNotFound),
        ReportFormat::Csv => Ok(csv::csv_records(body)),
        ReportFormat::HtmlTable => Ok(html::table_with_column(body, "component")?.records()),
    }
}

/// A CSV request answered with an HTML page means the session was not accepted.
fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start().chars().take(256).collect::<String>();
    let head = html::to_lowercase_fast(&head);
    head.starts_with("<!doctype") || (head.starts_with('<') && head.contains("<html"))
}
