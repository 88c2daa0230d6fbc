use crate::model::{BugListReport, BugRecord, BugStatus, PullRequestRecord, QaContactSummary, TeamSummary, TOTAL_LABEL};
use indexmap::IndexMap;
use serde_json::{json, Value};

const SEPARATOR: &str = "─────────────────────────";
const PULL_REQUESTS_CARD_ID: &str = "open-pull-requests";

/// Payload posted to the chat webhook.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    Text(String),
    Card(Value),
}

impl ChatMessage {
    pub fn payload(&self) -> Value {
        match self {
            ChatMessage::Text(text) => json!({ "text": text }),
            ChatMessage::Card(card) => json!({ "cardsV2": [card] }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugListKind {
    PriorityMiss,
    SlaMissed,
}

impl BugListKind {
    fn title(&self, team: &str) -> String {
        match self {
            BugListKind::PriorityMiss => format!("🚨 *PRIORITY BUG MISS - {} TEAM*", team.to_uppercase()),
            BugListKind::SlaMissed => format!("⏰ *SLA MISSED BUGS - {} TEAM*", team.to_uppercase()),
        }
    }
}

fn header(title: &str, generated_at: &str) -> String {
    format!("{title}\n📅 {generated_at}\n{SEPARATOR}\n\n")
}

pub fn team_status_message(summary: &TeamSummary, report_url: &str, generated_at: &str) -> ChatMessage {
    let title = format!("🐞 *BUGZILLA STATUS REPORT - {} TEAM*", summary.team.to_uppercase());
    let mut text = header(&title, generated_at);
    for status in BugStatus::ACTIVE {
        text += &format!("• *{}:* {}\n", status, summary.count(status));
    }
    text += &format!("\n📊 *TOTAL ACTIVE ISSUES: {}*\n\n", summary.total);
    text += &format!("🔗 <{report_url}|View Full Report>");
    ChatMessage::Text(text)
}

/// Per-contact blocks followed by the synthetic totals record.
pub fn qa_status_message(summaries: &[QaContactSummary], generated_at: &str) -> ChatMessage {
    let mut text = header("🔍 *QA STATUS REPORT*", generated_at);
    let (totals, contacts): (Vec<_>, Vec<_>) = summaries
        .iter()
        .partition(|summary| summary.qa_contact == TOTAL_LABEL);

    for contact in contacts {
        text += &format!("*{}*\n", contact.qa_contact);
        text += &status_lines(contact);
        text += &format!("📊 Total: {}\n\n", contact.total);
    }
    if let Some(total) = totals.first() {
        text += "*OVERALL TOTALS*\n";
        text += &status_lines(total);
        text += &format!("📊 *TOTAL BUGS: {}*\n\n", total.total);
    }
    ChatMessage::Text(text)
}

fn status_lines(summary: &QaContactSummary) -> String {
    BugStatus::QA_TRIAGE
        .iter()
        .map(|status| (status, summary.count(*status)))
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| format!("• {status}: {count}\n"))
        .collect()
}

/// Bugs grouped by component, each linking back to the tracker.
pub fn bug_list_message(
    report: &BugListReport,
    kind: BugListKind,
    tracker_url: &str,
    generated_at: &str,
) -> ChatMessage {
    let mut text = header(&kind.title(&report.team), generated_at);
    for group in &report.groups {
        text += &format!("*{}* ({})\n", group.component, group.bugs.len());
        for bug in &group.bugs {
            text += &bug_line(bug, tracker_url);
        }
        text += "\n";
    }
    text += &format!("📊 *TOTAL BUGS: {}*", report.count);
    ChatMessage::Text(text)
}

fn bug_line(bug: &BugRecord, tracker_url: &str) -> String {
    let id = field(bug, "bug_id");
    let summary = field(bug, "short_desc");
    let link = match id {
        "" => summary.to_string(),
        id => format!("<{}/show_bug.cgi?id={id}|#{id}> {summary}", tracker_url.trim_end_matches('/')),
    };
    let mut line = format!("• {link}\n");
    let status = field(bug, "bug_status");
    let assignee = field(bug, "assigned_to");
    if !status.is_empty() || !assignee.is_empty() {
        line += &format!("    _{status}_ | 👤 {assignee}\n");
    }
    line
}

fn field<'a>(bug: &'a BugRecord, column: &str) -> &'a str {
    bug.iter()
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(column))
        .map(|(_, value)| value.trim())
        .unwrap_or_default()
}

/// Card with one section per repository, newest pull request first.
pub fn open_pull_requests_message(pull_requests: &[PullRequestRecord], generated_at: &str) -> ChatMessage {
    let mut by_repository: IndexMap<&str, Vec<Value>> = IndexMap::new();
    for pr in pull_requests {
        by_repository.entry(pr.repository.as_str()).or_default().push(json!({
            "decoratedText": {
                "topLabel": format!("{} | {}", pr.author, pr.created_on_display()),
                "text": format!("<b>{}</b>", pr.title),
                "bottomLabel": format!("{} → {}", pr.source_branch, pr.destination_branch),
                "wrapText": true,
                "button": {
                    "text": "Open",
                    "onClick": { "openLink": { "url": pr.url } }
                }
            }
        }));
    }

    let mut sections = by_repository
        .into_iter()
        .map(|(repository, widgets)| {
            json!({
                "header": format!("{repository} ({})", widgets.len()),
                "collapsible": widgets.len() > 5,
                "uncollapsibleWidgetsCount": 5,
                "widgets": widgets,
            })
        })
        .collect::<Vec<_>>();
    if sections.is_empty() {
        sections.push(json!({
            "widgets": [{ "textParagraph": { "text": "No open pull requests 🎉" } }]
        }));
    }

    ChatMessage::Card(json!({
        "cardId": PULL_REQUESTS_CARD_ID,
        "card": {
            "header": {
                "title": "🔀 Open Pull Requests",
                "subtitle": format!("{} open | {generated_at}", pull_requests.len()),
            },
            "sections": sections,
        }
    }))
}
