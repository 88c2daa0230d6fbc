mod config;
mod envelope;
mod filter;
mod pull_request;
mod status;
mod summary;

pub use config::{ChatConfig, Config, Credentials, SourceHostConfig, TrackerConfig, WebhookKind};
pub use config::DEFAULT_TIMEOUT;
pub use envelope::ReportEnvelope;
pub use filter::{Endpoint, ReportFilter, ReportFormat};
pub use pull_request::{normalize_author, parse_author_filter, PullRequestRecord};
pub use status::{BugStatus, TOTAL_LABEL};
pub use summary::{BugListReport, BugRecord, ComponentGroup, QaContactSummary, StatusCounts, TeamSummary};
