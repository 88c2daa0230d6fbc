#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use bugzilla_chat_report::model::{ChatConfig, Config, Credentials, TrackerConfig};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const EMAIL: &str = "qa@example.com";
pub const PASSWORD: &str = "secret";
pub const LOGIN_TOKEN: &str = "1700000000-login";
pub const FORM_TOKEN: &str = "form-token";

pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html><html><body>
<form name="login" action="report.cgi" method="POST">
  <input type="hidden" name="Bugzilla_login_token" value="1700000000-login">
  <input type="text" name="Bugzilla_login">
</form>
<form id="forgot"><input type="hidden" id="token" name="token" value="form-token"></form>
</body></html>"#;

pub const HTML_REPORT: &str = r#"<!DOCTYPE html><html><body>
<table id="layout"><tr><td>
  <table class="tabular">
    <tr><th>&nbsp;</th><th>OS</th><th>Web</th><th>Total</th></tr>
    <tr><td>UNCONFIRMED</td><td>3</td><td>1</td><td>4</td></tr>
    <tr><td>CONFIRMED</td><td>.</td><td>2</td><td>2</td></tr>
    <tr><td>RE-OPENED</td><td>1</td><td>.</td><td>1</td></tr>
    <tr><td>Total</td><td>4</td><td>3</td><td>7</td></tr>
  </table>
</td></tr></table>
</body></html>"#;

/// In-process stand-in for the tracker and the chat webhook.
pub struct FakeTracker {
    pub login_page: String,
    pub report_status: u16,
    pub report_body: String,
    pub buglist_body: String,
    pub webhook_status: u16,
    pub login_sets_cookie: bool,
    pub login_posts: AtomicUsize,
    pub report_queries: Mutex<Vec<Vec<(String, String)>>>,
    pub messages: Mutex<Vec<Value>>,
}

impl FakeTracker {
    pub fn new(report_body: &str) -> Self {
        Self {
            login_page: LOGIN_PAGE.to_string(),
            report_status: 200,
            report_body: report_body.to_string(),
            buglist_body: String::new(),
            webhook_status: 200,
            login_sets_cookie: true,
            login_posts: AtomicUsize::new(0),
            report_queries: Mutex::new(vec![]),
            messages: Mutex::new(vec![]),
        }
    }

    pub fn login_posts(&self) -> usize {
        self.login_posts.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<Value> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> Vec<(String, String)> {
        self.report_queries.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/report.cgi", get(report_page).post(login))
            .route("/buglist.cgi", get(buglist))
            .route("/webhook", post(webhook))
            .with_state(self)
    }
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookies| cookies.contains("Bugzilla_login="))
}

async fn report_page(
    State(fake): State<Arc<FakeTracker>>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if !has_session(&headers) {
        return fake.login_page.clone().into_response();
    }
    fake.report_queries.lock().unwrap().push(query);
    let status = StatusCode::from_u16(fake.report_status).unwrap();
    (status, fake.report_body.clone()).into_response()
}

async fn login(
    State(fake): State<Arc<FakeTracker>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    fake.login_posts.fetch_add(1, Ordering::SeqCst);
    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();
    let accepted = field("Bugzilla_login") == EMAIL
        && field("Bugzilla_password") == PASSWORD
        && field("Bugzilla_login_token") == LOGIN_TOKEN
        && field("token") == FORM_TOKEN;
    if !accepted {
        return "<p>The username or password you entered is not valid.</p>".into_response();
    }
    if !fake.login_sets_cookie {
        return "Welcome".into_response();
    }
    ([(SET_COOKIE, "Bugzilla_login=42; Path=/")], "Logged in").into_response()
}

async fn buglist(
    State(fake): State<Arc<FakeTracker>>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if !has_session(&headers) {
        return fake.login_page.clone().into_response();
    }
    fake.report_queries.lock().unwrap().push(query);
    fake.buglist_body.clone().into_response()
}

async fn webhook(State(fake): State<Arc<FakeTracker>>, Json(message): Json<Value>) -> Response {
    fake.messages.lock().unwrap().push(message);
    let status = StatusCode::from_u16(fake.webhook_status).unwrap();
    (status, "webhook says hi").into_response()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{address}")
}

pub async fn start(fake: FakeTracker) -> (Arc<FakeTracker>, Config) {
    let fake = Arc::new(fake);
    let base = spawn(fake.clone().router()).await;
    (fake, config(&base))
}

pub fn config(base: &str) -> Config {
    let tracker = TrackerConfig::new(base, Credentials::new(EMAIL, PASSWORD))
        .unwrap()
        .with_products(vec!["Web".into(), "Mobile App".into()])
        .with_components(vec!["API".into(), "UI".into()]);
    Config::new(tracker, ChatConfig::new(Some(format!("{base}/webhook"))))
}
