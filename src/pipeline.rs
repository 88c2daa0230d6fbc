use crate::analyze::{find_team, ComponentGrouper, QaContactAnalyzer, TeamAnalyzer};
use crate::bitbucket::{PageProgress, PullRequestFetcher};
use crate::error::Result;
use crate::model::{
    parse_author_filter, BugListReport, Config, PullRequestRecord, QaContactSummary, ReportEnvelope,
    ReportFilter, ReportFormat, TeamSummary,
};
use crate::parse::{self, NormalizedTable};
use crate::report::chat::{
    bug_list_message, open_pull_requests_message, qa_status_message, team_status_message,
};
use crate::report::{BugListKind, ChatDispatcher, ChatMessage};
use crate::tracker::{RawReport, ReportFetcher, SessionProvider};
use crate::utils::time::display_now;
use serde_json::Value;

pub const DEFAULT_TEAM: &str = "OS";
pub const DEFAULT_SLA_DAYS: u32 = 3;

/// Point a report request has reached. Any failure aborts the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unauthenticated,
    Authenticated,
    Fetched,
    Normalized,
    Aggregated,
    Dispatched,
}

impl Stage {
    pub fn message(&self) -> &'static str {
        match self {
            Stage::Unauthenticated => "Logging in",
            Stage::Authenticated => "Fetching report",
            Stage::Fetched => "Parsing report",
            Stage::Normalized => "Aggregating",
            Stage::Aggregated => "Posting to chat",
            Stage::Dispatched => "Done",
        }
    }
}

pub type StageProgress<'a> = Box<dyn FnMut(Stage) + Send + 'a>;

/// Where, and whether, the chat notification goes.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub webhook: Option<String>,
    pub skip_chat: bool,
}

impl DispatchOptions {
    pub fn new(webhook: Option<String>, skip_chat: bool) -> Self {
        Self { webhook, skip_chat }
    }
}

/// Typed result of a request alongside the envelope returned to callers.
#[derive(Debug, Clone)]
pub struct Report<T> {
    pub data: T,
    pub envelope: ReportEnvelope,
}

pub async fn current_day_status<'a>(
    config: &Config,
    team: &str,
    format: ReportFormat,
    dispatch: &DispatchOptions,
    mut cb: StageProgress<'a>,
) -> Result<Report<Vec<TeamSummary>>> {
    let filter = ReportFilter::current_day_status(&config.tracker, format);
    let raw = fetch_report(config, &filter, &mut cb).await?;

    let table = NormalizedTable::from_raw(&parse::status_table(&raw.body, raw.format)?);
    cb(Stage::Normalized);
    let summaries = table.team_summaries();
    cb(Stage::Aggregated);
    tracing::info!(teams = summaries.len(), "aggregated team summaries");

    let envelope = ReportEnvelope::success(serde_json::to_value(&summaries)?);
    if dispatch.skip_chat {
        return Ok(Report {
            data: summaries,
            envelope,
        });
    }
    let summary = find_team(&summaries, team)?;
    let message = team_status_message(summary, &filter.report_url(&config.tracker), &display_now());
    let envelope = deliver(config, dispatch, &message, envelope, &mut cb).await?;
    Ok(Report {
        data: summaries,
        envelope,
    })
}

pub async fn qa_status<'a>(
    config: &Config,
    format: ReportFormat,
    dispatch: &DispatchOptions,
    mut cb: StageProgress<'a>,
) -> Result<Report<Vec<QaContactSummary>>> {
    let filter = ReportFilter::qa_status(&config.tracker, format);
    let raw = fetch_report(config, &filter, &mut cb).await?;

    let table = parse::status_table(&raw.body, raw.format)?;
    cb(Stage::Normalized);
    let summaries = table.qa_contact_summaries()?;
    cb(Stage::Aggregated);
    tracing::info!(contacts = summaries.len().saturating_sub(1), "aggregated QA contact summaries");

    let envelope = ReportEnvelope::success(serde_json::to_value(&summaries)?);
    let envelope = if dispatch.skip_chat {
        envelope
    } else {
        let message = qa_status_message(&summaries, &display_now());
        deliver(config, dispatch, &message, envelope, &mut cb).await?
    };
    Ok(Report {
        data: summaries,
        envelope,
    })
}

pub async fn priority_bug_miss<'a>(
    config: &Config,
    team: &str,
    dispatch: &DispatchOptions,
    cb: StageProgress<'a>,
) -> Result<Report<Option<BugListReport>>> {
    let filter = ReportFilter::priority_bug_miss(&config.tracker, team);
    bug_list(config, &filter, team, BugListKind::PriorityMiss, dispatch, cb).await
}

/// Open bugs of `team` created within the last `days` days (0 means the default window).
pub async fn sla_missed_bugs<'a>(
    config: &Config,
    team: &str,
    days: u32,
    dispatch: &DispatchOptions,
    cb: StageProgress<'a>,
) -> Result<Report<Option<BugListReport>>> {
    let filter = ReportFilter::sla_missed(&config.tracker, team, days);
    bug_list(config, &filter, team, BugListKind::SlaMissed, dispatch, cb).await
}

async fn bug_list<'a>(
    config: &Config,
    filter: &ReportFilter,
    team: &str,
    kind: BugListKind,
    dispatch: &DispatchOptions,
    mut cb: StageProgress<'a>,
) -> Result<Report<Option<BugListReport>>> {
    let raw = fetch_report(config, filter, &mut cb).await?;
    let bugs = parse::bug_records(&raw.body, raw.format)?;
    cb(Stage::Normalized);

    if bugs.is_empty() {
        tracing::info!(team, "no bugs matched");
        let message = match kind {
            BugListKind::PriorityMiss => "No priority miss bugs found",
            BugListKind::SlaMissed => "No SLA miss bugs found",
        };
        return Ok(Report {
            data: None,
            envelope: ReportEnvelope::success(Value::String(message.to_string())),
        });
    }

    let report = BugListReport {
        team: team.to_string(),
        count: bugs.len(),
        groups: bugs.group_by_component(),
        bugs,
    };
    cb(Stage::Aggregated);
    tracing::info!(team, count = report.count, components = report.groups.len(), "grouped bugs");

    let envelope = ReportEnvelope::success(serde_json::to_value(&report)?);
    let envelope = if dispatch.skip_chat {
        envelope
    } else {
        let message = bug_list_message(&report, kind, &config.tracker.base_url, &display_now());
        deliver(config, dispatch, &message, envelope, &mut cb).await?
    };
    Ok(Report {
        data: Some(report),
        envelope,
    })
}

/// Open pull requests, optionally filtered by a comma separated author list.
pub async fn open_pull_requests<'a>(
    config: &Config,
    authors: Option<&str>,
    dispatch: &DispatchOptions,
    cb: PageProgress<'a>,
) -> Result<Report<Vec<PullRequestRecord>>> {
    let source_host = config.source_host()?;
    let client = config.http_client()?;
    let authors = parse_author_filter(authors);
    let pull_requests = source_host.open_pull_requests(&client, &authors, cb).await?;

    let envelope = ReportEnvelope::success(serde_json::to_value(&pull_requests)?);
    let envelope = if dispatch.skip_chat {
        envelope
    } else {
        let message = open_pull_requests_message(&pull_requests, &display_now());
        let mut no_stages: StageProgress = Box::new(|_| {});
        deliver(config, dispatch, &message, envelope, &mut no_stages).await?
    };
    Ok(Report {
        data: pull_requests,
        envelope,
    })
}

async fn fetch_report(
    config: &Config,
    filter: &ReportFilter,
    cb: &mut StageProgress<'_>,
) -> Result<RawReport> {
    cb(Stage::Unauthenticated);
    let session = config.tracker.login(config.timeout).await?;
    cb(Stage::Authenticated);
    let raw = session.fetch(filter).await?;
    cb(Stage::Fetched);
    Ok(raw)
}

/// A rejected post keeps the report and records why it was not delivered.
async fn deliver(
    config: &Config,
    dispatch: &DispatchOptions,
    message: &ChatMessage,
    envelope: ReportEnvelope,
    cb: &mut StageProgress<'_>,
) -> Result<ReportEnvelope> {
    let (webhook, kind) = config.chat.resolve(dispatch.webhook.as_deref())?;
    let client = config.http_client()?;
    match client.dispatch(&webhook, message).await {
        Ok(()) => {
            cb(Stage::Dispatched);
            Ok(envelope.posted(kind))
        }
        Err(e) => {
            tracing::warn!(error = %e, webhook = kind.as_str(), "chat dispatch failed");
            Ok(envelope.dispatch_failed(e))
        }
    }
}
