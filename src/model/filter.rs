use crate::model::{BugStatus, TrackerConfig};
use url::Url;

pub const ALL_SEVERITIES: [&str; 6] = ["blocker", "critical", "major", "normal", "minor", "trivial"];
pub const ALL_PRIORITIES: [&str; 6] = ["Highest", "High", "Normal", "Low", "Lowest", "---"];
pub const BUG_CREATION_FIELD: &str = "[Bug creation]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    HtmlTable,
    Csv,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" | "table" => Some(ReportFormat::HtmlTable),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `report.cgi`, a two-axis count table.
    Report,
    /// `buglist.cgi`, one row per bug.
    BugList,
}

impl Endpoint {
    pub fn cgi(&self) -> &'static str {
        match self {
            Endpoint::Report => "report.cgi",
            Endpoint::BugList => "buglist.cgi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub endpoint: Endpoint,
    pub format: ReportFormat,
    pub severities: Vec<String>,
    pub statuses: Vec<BugStatus>,
    pub priorities: Vec<String>,
    pub products: Vec<String>,
    pub components: Vec<String>,
    pub versions: Vec<String>,
    pub changed_field: Option<String>,
    pub changed_to: Option<String>,
    pub x_axis_field: Option<String>,
    pub y_axis_field: Option<String>,
    pub saved_report_id: Option<String>,
}

// New
impl ReportFilter {
    pub fn new(endpoint: Endpoint, format: ReportFormat) -> Self {
        Self {
            endpoint,
            format,
            severities: vec![],
            statuses: vec![],
            priorities: vec![],
            products: vec![],
            components: vec![],
            versions: vec![],
            changed_field: None,
            changed_to: None,
            x_axis_field: None,
            y_axis_field: None,
            saved_report_id: None,
        }
    }

    /// Version (team) x status counts of every bug still open, created up to now.
    pub fn current_day_status(tracker: &TrackerConfig, format: ReportFormat) -> Self {
        let mut filter = Self::new(Endpoint::Report, format);
        filter.severities = to_strings(&ALL_SEVERITIES);
        filter.statuses = BugStatus::ACTIVE.to_vec();
        filter.priorities = to_strings(&ALL_PRIORITIES);
        filter.products = tracker.products.clone();
        filter.changed_field = Some(BUG_CREATION_FIELD.to_string());
        filter.changed_to = Some("Now".to_string());
        filter.x_axis_field = Some("version".to_string());
        filter.y_axis_field = Some("bug_status".to_string());
        filter.saved_report_id = tracker.saved_report_id.clone();
        filter
    }

    /// QA contact x status counts over the triage statuses.
    pub fn qa_status(tracker: &TrackerConfig, format: ReportFormat) -> Self {
        let mut filter = Self::new(Endpoint::Report, format);
        filter.severities = to_strings(&ALL_SEVERITIES);
        filter.statuses = BugStatus::QA_TRIAGE.to_vec();
        filter.priorities = to_strings(&ALL_PRIORITIES);
        filter.products = tracker.products.clone();
        filter.changed_field = Some(BUG_CREATION_FIELD.to_string());
        filter.changed_to = Some("Now".to_string());
        filter.x_axis_field = Some("bug_status".to_string());
        filter.y_axis_field = Some("qa_contact".to_string());
        filter
    }

    /// Blocker and critical bugs of a team that were created within the last day.
    pub fn priority_bug_miss(tracker: &TrackerConfig, team: &str) -> Self {
        let mut filter = Self::new(Endpoint::BugList, ReportFormat::Csv);
        filter.severities = to_strings(&["blocker", "critical"]);
        filter.statuses = BugStatus::ACTIVE.to_vec();
        filter.priorities = to_strings(&ALL_PRIORITIES);
        filter.products = tracker.products.clone();
        filter.versions = vec![team.to_string()];
        filter.changed_field = Some(BUG_CREATION_FIELD.to_string());
        filter.changed_to = Some("-1D".to_string());
        filter
    }

    /// Open bugs of a team created within the last `days` days.
    pub fn sla_missed(tracker: &TrackerConfig, team: &str, days: u32) -> Self {
        let days = if days == 0 { 3 } else { days };
        let mut filter = Self::new(Endpoint::BugList, ReportFormat::Csv);
        filter.severities = to_strings(&ALL_SEVERITIES);
        filter.statuses = BugStatus::ACTIVE.to_vec();
        filter.priorities = to_strings(&ALL_PRIORITIES);
        filter.products = tracker.products.clone();
        filter.components = tracker.components.clone();
        filter.versions = vec![team.to_string()];
        filter.changed_field = Some(BUG_CREATION_FIELD.to_string());
        filter.changed_to = Some(format!("-{days}d"));
        filter
    }
}

// Query
impl ReportFilter {
    /// Query pairs in tracker order; list filters repeat their key.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![];
        pairs.extend(self.severities.iter().map(|s| ("bug_severity", s.clone())));
        pairs.extend(self.statuses.iter().map(|s| ("bug_status", s.label().to_string())));
        if let Some(field) = &self.changed_field {
            pairs.push(("chfield", field.clone()));
        }
        if let Some(to) = &self.changed_to {
            pairs.push(("chfieldto", to.clone()));
        }
        pairs.extend(self.components.iter().map(|c| ("component", c.clone())));
        pairs.extend(self.priorities.iter().map(|p| ("priority", p.clone())));
        pairs.extend(self.products.iter().map(|p| ("product", p.clone())));
        pairs.extend(self.versions.iter().map(|v| ("version", v.clone())));
        if let Some(x) = &self.x_axis_field {
            pairs.push(("x_axis_field", x.clone()));
        }
        if let Some(y) = &self.y_axis_field {
            pairs.push(("y_axis_field", y.clone()));
        }
        if self.endpoint == Endpoint::Report {
            pairs.push(("format", "table".to_string()));
        }
        pairs.push(("action", "wrap".to_string()));
        if self.format == ReportFormat::Csv {
            pairs.push(("ctype", "csv".to_string()));
        }
        if let Some(id) = &self.saved_report_id {
            pairs.push(("saved_report_id", id.clone()));
        }
        pairs
    }

    /// Browsable link to the HTML rendition of this report.
    pub fn report_url(&self, tracker: &TrackerConfig) -> String {
        let mut html = self.clone();
        html.format = ReportFormat::HtmlTable;
        let endpoint = tracker.endpoint(self.endpoint.cgi());
        match Url::parse_with_params(&endpoint, html.query_pairs()) {
            Ok(url) => url.to_string(),
            Err(_) => endpoint,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
