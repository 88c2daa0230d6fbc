use crate::error::{Error, Result};
use crate::model::{ReportEnvelope, ReportFormat};
use crate::pipeline::{self, DispatchOptions, DEFAULT_SLA_DAYS, DEFAULT_TEAM};
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    notify_team: Option<String>,
    #[serde(alias = "webhook_url")]
    google_chat_webhook: Option<String>,
    #[serde(default)]
    skip_chat: bool,
    days: Option<u32>,
    format: Option<String>,
}

impl ReportQuery {
    fn team(&self) -> &str {
        self.notify_team
            .as_deref()
            .map(str::trim)
            .filter(|team| !team.is_empty())
            .unwrap_or(DEFAULT_TEAM)
    }

    fn format(&self) -> Result<ReportFormat> {
        match &self.format {
            None => Ok(ReportFormat::Csv),
            Some(value) => ReportFormat::parse(value)
                .ok_or_else(|| Error::config(format!("unknown report format `{value}`"))),
        }
    }

    fn dispatch(&self) -> DispatchOptions {
        DispatchOptions::new(self.google_chat_webhook.clone(), self.skip_chat)
    }
}

#[derive(Debug, Deserialize)]
pub struct PullRequestQuery {
    authors: Option<String>,
    #[serde(alias = "google_chat_webhook")]
    webhook_url: Option<String>,
    #[serde(default)]
    skip_chat: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "active",
        "message": "Bugzilla Report API is running",
    }))
}

pub async fn current_day_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportEnvelope>> {
    let report = pipeline::current_day_status(
        &state.config,
        query.team(),
        query.format()?,
        &query.dispatch(),
        Box::new(|_| {}),
    )
    .await?;
    Ok(Json(report.envelope))
}

pub async fn qa_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportEnvelope>> {
    let report =
        pipeline::qa_status(&state.config, query.format()?, &query.dispatch(), Box::new(|_| {}))
            .await?;
    Ok(Json(report.envelope))
}

pub async fn priority_bug_miss(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportEnvelope>> {
    let report = pipeline::priority_bug_miss(
        &state.config,
        query.team(),
        &query.dispatch(),
        Box::new(|_| {}),
    )
    .await?;
    Ok(Json(report.envelope))
}

pub async fn sla_missed_bugs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportEnvelope>> {
    let report = pipeline::sla_missed_bugs(
        &state.config,
        query.team(),
        query.days.unwrap_or(DEFAULT_SLA_DAYS),
        &query.dispatch(),
        Box::new(|_| {}),
    )
    .await?;
    Ok(Json(report.envelope))
}

pub async fn open_prs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PullRequestQuery>,
) -> Result<Json<ReportEnvelope>> {
    let dispatch = DispatchOptions::new(query.webhook_url.clone(), query.skip_chat);
    let report = pipeline::open_pull_requests(
        &state.config,
        query.authors.as_deref(),
        &dispatch,
        Box::new(|page: usize| tracing::debug!(page, "fetching pull request page")),
    )
    .await?;
    Ok(Json(report.envelope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn query(raw: &str) -> ReportQuery {
        serde_json::from_value(serde_json::from_str(raw).unwrap()).unwrap()
    }

    #[test]
    fn query_defaults() {
        let q = query(r#"{"notify_team": "  "}"#);
        assert_eq!(q.team(), "OS");
        assert_eq!(q.format().unwrap(), ReportFormat::Csv);
        assert!(!q.dispatch().skip_chat);
    }

    #[test]
    fn webhook_alias_and_format() {
        let q = query(r#"{"webhook_url": "https://chat/x", "format": "html", "skip_chat": true}"#);
        assert_eq!(q.dispatch().webhook.as_deref(), Some("https://chat/x"));
        assert_eq!(q.format().unwrap(), ReportFormat::HtmlTable);
        assert!(matches!(query(r#"{"format": "xml"}"#).format(), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn errors_render_detail() {
        let response = Error::UnknownTeam {
            team: "qa".into(),
            available: vec!["OS".into()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("available teams: OS"));
    }
}
