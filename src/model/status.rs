use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal label of the aggregate row/column emitted by the tracker.
pub const TOTAL_LABEL: &str = "Total";

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum BugStatus {
    #[serde(rename = "UNCONFIRMED")]
    Unconfirmed,
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "NEEDS_INFO")]
    NeedsInfo,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "IN_PROGRESS_DEV")]
    InProgressDev,
    #[serde(rename = "UNDER_REVIEW")]
    UnderReview,
    #[serde(rename = "RE-OPENED")]
    Reopened,
    #[serde(rename = "RESOLVED")]
    Resolved,
}

impl BugStatus {
    pub const ALL: [BugStatus; 8] = [
        BugStatus::Unconfirmed,
        BugStatus::Confirmed,
        BugStatus::NeedsInfo,
        BugStatus::InProgress,
        BugStatus::InProgressDev,
        BugStatus::UnderReview,
        BugStatus::Reopened,
        BugStatus::Resolved,
    ];

    /// Statuses of a bug that still needs work, in message order.
    pub const ACTIVE: [BugStatus; 7] = [
        BugStatus::Unconfirmed,
        BugStatus::Confirmed,
        BugStatus::InProgress,
        BugStatus::InProgressDev,
        BugStatus::NeedsInfo,
        BugStatus::UnderReview,
        BugStatus::Reopened,
    ];

    /// Statuses tracked by the QA triage report, in message order.
    pub const QA_TRIAGE: [BugStatus; 5] = [
        BugStatus::Unconfirmed,
        BugStatus::Confirmed,
        BugStatus::NeedsInfo,
        BugStatus::InProgressDev,
        BugStatus::Resolved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BugStatus::Unconfirmed => "UNCONFIRMED",
            BugStatus::Confirmed => "CONFIRMED",
            BugStatus::NeedsInfo => "NEEDS_INFO",
            BugStatus::InProgress => "IN_PROGRESS",
            BugStatus::InProgressDev => "IN_PROGRESS_DEV",
            BugStatus::UnderReview => "UNDER_REVIEW",
            BugStatus::Reopened => "RE-OPENED",
            BugStatus::Resolved => "RESOLVED",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|status| status.label() == label)
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
