mod common;

use bugzilla_chat_report::error::{AuthFailure, Error};
use bugzilla_chat_report::model::{BugStatus, Credentials, ReportFormat, TrackerConfig, WebhookKind};
use bugzilla_chat_report::pipeline::{self, DispatchOptions, Stage};
use common::{FakeTracker, HTML_REPORT};
use std::sync::{Arc, Mutex};

fn post() -> DispatchOptions {
    DispatchOptions::default()
}

fn skip_chat() -> DispatchOptions {
    DispatchOptions::new(None, true)
}

#[tokio::test]
async fn html_report_is_summarized_and_posted() {
    let (fake, config) = common::start(FakeTracker::new(HTML_REPORT)).await;
    let stages = Arc::new(Mutex::new(Vec::<Stage>::new()));
    let recorded = stages.clone();

    let report = pipeline::current_day_status(
        &config,
        "web",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(move |stage: Stage| recorded.lock().unwrap().push(stage)),
    )
    .await
    .unwrap();

    assert_eq!(fake.login_posts(), 1);
    let teams = report.data.iter().map(|s| s.team.as_str()).collect::<Vec<_>>();
    assert_eq!(teams, vec!["OS", "Web"]);
    assert_eq!(report.data[0].count(BugStatus::Confirmed), 0);
    assert_eq!(report.data[0].total, 4);
    assert_eq!(report.data[1].total, 3);

    assert!(report.envelope.posted_to_chat);
    assert_eq!(report.envelope.webhook_used, WebhookKind::Default);
    assert_eq!(report.envelope.data[1]["UNCONFIRMED"], 1);

    let messages = fake.messages();
    assert_eq!(messages.len(), 1);
    let text = messages[0]["text"].as_str().unwrap();
    assert!(text.contains("BUGZILLA STATUS REPORT - WEB TEAM"));
    assert!(text.contains("📊 *TOTAL ACTIVE ISSUES: 3*"));

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            Stage::Unauthenticated,
            Stage::Authenticated,
            Stage::Fetched,
            Stage::Normalized,
            Stage::Aggregated,
            Stage::Dispatched,
        ]
    );
}

#[tokio::test]
async fn csv_report_round_trip() {
    let csv = "\"Status / Version\",\"OS\",\"Web\"\nUNCONFIRMED,3,5\nCONFIRMED,.,2\n";
    let (fake, config) = common::start(FakeTracker::new(csv)).await;

    let report = pipeline::current_day_status(
        &config,
        "OS",
        ReportFormat::Csv,
        &skip_chat(),
        Box::new(|_| {}),
    )
    .await
    .unwrap();

    assert_eq!(report.data.len(), 2);
    assert_eq!(report.data[0].count(BugStatus::Unconfirmed), 3);
    assert_eq!(report.data[0].count(BugStatus::Confirmed), 0);
    assert_eq!(report.data[1].total, 7);
    assert!(!report.envelope.posted_to_chat);
    assert_eq!(report.envelope.webhook_used, WebhookKind::None);
    assert!(fake.messages().is_empty());

    let query = fake.last_query();
    assert!(query.contains(&("ctype".to_string(), "csv".to_string())));
    assert!(query.contains(&("x_axis_field".to_string(), "version".to_string())));
    let products = query.iter().filter(|(key, _)| key == "product").count();
    assert_eq!(products, 2);
}

#[tokio::test]
async fn missing_token_stops_before_login() {
    let mut fake = FakeTracker::new(HTML_REPORT);
    fake.login_page = r#"<input type="hidden" name="Bugzilla_login_token" value="x">"#.to_string();
    let (fake, config) = common::start(fake).await;

    let result = pipeline::current_day_status(
        &config,
        "OS",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(|_| {}),
    )
    .await;

    assert!(matches!(result, Err(Error::TokenExtraction { missing: "token" })));
    assert_eq!(fake.login_posts(), 0);
}

#[tokio::test]
async fn rejected_credentials() {
    let (fake, config) = common::start(FakeTracker::new(HTML_REPORT)).await;
    let mut config = config;
    config.tracker = TrackerConfig::new(&config.tracker.base_url, Credentials::new(common::EMAIL, "wrong"))
        .unwrap();

    let result = pipeline::qa_status(&config, ReportFormat::Csv, &post(), Box::new(|_| {})).await;

    assert!(matches!(
        result,
        Err(Error::Authentication(AuthFailure::InvalidCredentials))
    ));
    assert_eq!(fake.login_posts(), 1);
}

#[tokio::test]
async fn login_without_session_cookie() {
    let mut fake = FakeTracker::new(HTML_REPORT);
    fake.login_sets_cookie = false;
    let (fake, config) = common::start(fake).await;

    let result = pipeline::current_day_status(
        &config,
        "OS",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(|_| {}),
    )
    .await;

    assert!(matches!(
        result,
        Err(Error::Authentication(AuthFailure::MissingSessionCookie))
    ));
    assert_eq!(fake.login_posts(), 1);
    assert!(fake.last_query().is_empty());
}

#[tokio::test]
async fn forbidden_report_is_a_fetch_error() {
    let mut fake = FakeTracker::new("<html>Access denied</html>");
    fake.report_status = 403;
    let (fake, config) = common::start(fake).await;

    let result = pipeline::current_day_status(
        &config,
        "OS",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(|_| {}),
    )
    .await;

    match result {
        Err(Error::Fetch { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("Access denied"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(fake.messages().is_empty());
}

#[tokio::test]
async fn page_without_status_table() {
    let page = "<html><body><table><tr><td>Search</td></tr></table></body></html>";
    let (_fake, config) = common::start(FakeTracker::new(page)).await;

    let result = pipeline::current_day_status(
        &config,
        "OS",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(|_| {}),
    )
    .await;

    assert!(matches!(result, Err(Error::TableNotFound)));
}

#[tokio::test]
async fn unknown_team_lists_available_teams() {
    let (fake, config) = common::start(FakeTracker::new(HTML_REPORT)).await;

    let result = pipeline::current_day_status(
        &config,
        "Mobile",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(|_| {}),
    )
    .await;

    match result {
        Err(Error::UnknownTeam { team, available }) => {
            assert_eq!(team, "Mobile");
            assert_eq!(available, vec!["OS", "Web"]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(fake.messages().is_empty());
}

#[tokio::test]
async fn failed_dispatch_keeps_the_report() {
    let mut fake = FakeTracker::new(HTML_REPORT);
    fake.webhook_status = 500;
    let (fake, config) = common::start(fake).await;

    let report = pipeline::current_day_status(
        &config,
        "OS",
        ReportFormat::HtmlTable,
        &post(),
        Box::new(|_| {}),
    )
    .await
    .unwrap();

    assert_eq!(fake.messages().len(), 1);
    assert!(!report.envelope.posted_to_chat);
    assert_eq!(report.envelope.webhook_used, WebhookKind::None);
    let dispatch_error = report.envelope.dispatch_error.unwrap();
    assert!(dispatch_error.contains("500"));
    assert_eq!(report.data.len(), 2);
}

#[tokio::test]
async fn qa_status_from_csv() {
    let csv = "\
QA Contact / Status,UNCONFIRMED,CONFIRMED,NEEDS_INFO,IN_PROGRESS_DEV,RESOLVED,Total
alice@example.com,1,.,0,2,0,3
bob@example.com,0,0,0,0,0,0
Total,1,0,0,2,0,3
";
    let (fake, config) = common::start(FakeTracker::new(csv)).await;

    let report = pipeline::qa_status(&config, ReportFormat::Csv, &post(), Box::new(|_| {}))
        .await
        .unwrap();

    let contacts = report.data.iter().map(|s| s.qa_contact.as_str()).collect::<Vec<_>>();
    assert_eq!(contacts, vec!["alice@example.com", "Total"]);
    assert_eq!(report.data[1].total, 3);
    assert!(report.envelope.posted_to_chat);

    let text = fake.messages()[0]["text"].as_str().unwrap().to_string();
    assert!(text.starts_with("🔍 *QA STATUS REPORT*"));
    assert!(text.contains("*alice@example.com*\n• UNCONFIRMED: 1\n• IN_PROGRESS_DEV: 2\n"));
    assert!(!text.contains("bob@example.com"));
}

#[tokio::test]
async fn sla_missed_bugs_grouped_and_posted() {
    let mut fake = FakeTracker::new("");
    fake.buglist_body = "\
bug_id,product,component,assigned_to,bug_status,short_desc
101,Web,API,dev@example.com,CONFIRMED,\"Crash, on save\"
102,Web,UI,dev2@example.com,UNCONFIRMED,Button misaligned
103,Web,,dev@example.com,RE-OPENED,Slow search
"
    .to_string();
    let (fake, config) = common::start(fake).await;
    let dispatch = DispatchOptions::new(Some(format!("{}/webhook", config.tracker.base_url)), false);

    let report = pipeline::sla_missed_bugs(&config, "OS", 0, &dispatch, Box::new(|_| {}))
        .await
        .unwrap();

    let data = report.data.unwrap();
    assert_eq!(data.count, 3);
    let components = data.groups.iter().map(|g| g.component.as_str()).collect::<Vec<_>>();
    assert_eq!(components, vec!["API", "UI", "Other"]);
    assert_eq!(report.envelope.webhook_used, WebhookKind::Custom);
    assert_eq!(report.envelope.data["count"], 3);
    assert_eq!(report.envelope.data["bugs"][0]["short_desc"], "Crash, on save");

    let query = fake.last_query();
    assert!(query.contains(&("chfieldto".to_string(), "-3d".to_string())));
    assert!(query.contains(&("version".to_string(), "OS".to_string())));
    assert!(query.contains(&("component".to_string(), "UI".to_string())));

    let text = fake.messages()[0]["text"].as_str().unwrap().to_string();
    assert!(text.contains("show_bug.cgi?id=101|#101> Crash, on save"));
}

#[tokio::test]
async fn empty_bug_list_skips_chat() {
    let mut fake = FakeTracker::new("");
    fake.buglist_body = "bug_id,product,component,assigned_to,bug_status,short_desc\n".to_string();
    let (fake, config) = common::start(fake).await;

    let report = pipeline::priority_bug_miss(&config, "OS", &post(), Box::new(|_| {}))
        .await
        .unwrap();

    assert!(report.data.is_none());
    assert_eq!(report.envelope.data, "No priority miss bugs found");
    assert!(!report.envelope.posted_to_chat);
    assert!(fake.messages().is_empty());

    let query = fake.last_query();
    assert!(query.contains(&("chfieldto".to_string(), "-1D".to_string())));
    assert!(query.contains(&("bug_severity".to_string(), "blocker".to_string())));
}
