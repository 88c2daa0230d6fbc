use crate::error::{Error, Result};
use crate::model::{PullRequestRecord, SourceHostConfig};
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

const PAGE_LEN: &str = "50";
const FIELDS: &str = "values.id,values.title,values.author,values.destination.repository.name,\
values.created_on,values.links.html.href,values.source.branch.name,values.destination.branch.name,next";

pub type PageProgress<'a> = Box<dyn FnMut(usize) + Send + 'a>;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    values: Vec<ApiPullRequest>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    title: String,
    author: ApiUser,
    source: ApiRef,
    destination: ApiRef,
    created_on: DateTime<Utc>,
    links: ApiLinks,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    branch: ApiName,
    repository: Option<ApiName>,
}

#[derive(Debug, Deserialize)]
struct ApiName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiLinks {
    html: ApiHref,
}

#[derive(Debug, Deserialize)]
struct ApiHref {
    href: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

impl From<ApiPullRequest> for PullRequestRecord {
    fn from(pr: ApiPullRequest) -> Self {
        let repository = pr.destination.repository.map(|r| r.name).unwrap_or_default();
        PullRequestRecord::new(
            pr.author.display_name,
            pr.title,
            repository,
            pr.source.branch.name,
            pr.destination.branch.name,
            pr.created_on,
            pr.links.html.href,
        )
    }
}

pub trait PullRequestFetcher {
    async fn fetch_open_pull_requests<'a>(
        &self,
        client: &Client,
        cb: PageProgress<'a>,
    ) -> Result<Vec<PullRequestRecord>>;

    /// Open pull requests by any of `authors` (all when empty), newest first.
    async fn open_pull_requests<'a>(
        &self,
        client: &Client,
        authors: &[String],
        cb: PageProgress<'a>,
    ) -> Result<Vec<PullRequestRecord>>;
}

impl PullRequestFetcher for SourceHostConfig {
    async fn open_pull_requests<'a>(
        &self,
        client: &Client,
        authors: &[String],
        cb: PageProgress<'a>,
    ) -> Result<Vec<PullRequestRecord>> {
        let mut pull_requests = self
            .fetch_open_pull_requests(client, cb)
            .await?
            .into_iter()
            .filter(|pr| pr.authored_by_any(authors))
            .collect::<Vec<_>>();
        pull_requests.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(pull_requests)
    }

    async fn fetch_open_pull_requests<'a>(
        &self,
        client: &Client,
        mut cb: PageProgress<'a>,
    ) -> Result<Vec<PullRequestRecord>> {
        let mut url = format!(
            "{}/repositories/{}/{}/pullrequests",
            self.api_url, self.workspace, self.repository
        );
        let mut first_page = true;
        let mut page = 1;
        let mut pull_requests: Vec<PullRequestRecord> = vec![];

        loop {
            cb(page);
            let mut request = client
                .get(&url)
                .basic_auth(&self.username, Some(&self.app_password))
                .header(ACCEPT, "application/json");
            // `next` links already carry the query.
            if first_page {
                request = request.query(&[("state", "OPEN"), ("pagelen", PAGE_LEN), ("fields", FIELDS)]);
            }
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            if status != 200 {
                return Err(source_host_error(status, &body));
            }

            let data: Page = serde_json::from_str(&body)?;
            pull_requests.extend(data.values.into_iter().map(PullRequestRecord::from));
            tracing::debug!(page, fetched = pull_requests.len(), "fetched pull request page");

            match data.next {
                Some(next) => url = next,
                None => break,
            }
            first_page = false;
            page += 1;
        }
        tracing::info!(
            repository = %self.repository,
            count = pull_requests.len(),
            "fetched open pull requests"
        );
        Ok(pull_requests)
    }
}

fn source_host_error(status: u16, body: &str) -> Error {
    let message = if status == 401 {
        "Authentication failed. Please check your Bitbucket credentials.".to_string()
    } else {
        serde_json::from_str::<ApiErrorBody>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string())
    };
    tracing::warn!(status, message = %message, "source host request failed");
    Error::SourceHost { status, message }
}
