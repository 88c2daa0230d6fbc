use crate::model::BugStatus;
use indexmap::IndexMap;
use serde::Serialize;

pub type StatusCounts = IndexMap<BugStatus, u64>;

/// One row of a bug-list export, keyed by column header.
pub type BugRecord = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub team: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: u64,
}

impl TeamSummary {
    pub fn new(team: impl ToString, counts: StatusCounts, total: u64) -> Self {
        Self {
            team: team.to_string(),
            counts,
            total,
        }
    }

    pub fn count(&self, status: BugStatus) -> u64 {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaContactSummary {
    pub qa_contact: String,
    pub statuses: StatusCounts,
    pub total: u64,
}

impl QaContactSummary {
    pub fn new(qa_contact: impl ToString, statuses: StatusCounts, total: u64) -> Self {
        Self {
            qa_contact: qa_contact.to_string(),
            statuses,
            total,
        }
    }

    pub fn count(&self, status: BugStatus) -> u64 {
        self.statuses.get(&status).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentGroup {
    pub component: String,
    pub bugs: Vec<BugRecord>,
}

/// Bug list of one team, as returned by the priority and SLA reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugListReport {
    pub team: String,
    pub bugs: Vec<BugRecord>,
    pub count: usize,
    #[serde(skip)]
    pub groups: Vec<ComponentGroup>,
}
