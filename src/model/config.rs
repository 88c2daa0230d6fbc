use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl ToString, password: impl ToString) -> Self {
        Self {
            email: email.to_string().trim().to_string(),
            password: password.to_string().trim().to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub saved_report_id: Option<String>,
    pub products: Vec<String>,
    pub components: Vec<String>,
}

// New
impl TrackerConfig {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            credentials,
            saved_report_id: None,
            products: vec![],
            components: vec![],
        })
    }

    pub fn with_products(mut self, products: Vec<String>) -> Self {
        self.products = products;
        self
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.components = components;
        self
    }

    pub fn with_saved_report_id(mut self, id: Option<String>) -> Self {
        self.saved_report_id = id.filter(|id| !id.trim().is_empty());
        self
    }

    /// Absolute URL of a tracker CGI endpoint, e.g. `report.cgi`.
    pub fn endpoint(&self, cgi: &str) -> String {
        format!("{}/{}", self.base_url, cgi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookKind {
    Custom,
    Default,
    None,
}

impl WebhookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookKind::Custom => "custom",
            WebhookKind::Default => "default",
            WebhookKind::None => "none",
        }
    }
}

#[derive(Clone, Default)]
pub struct ChatConfig {
    pub default_webhook: Option<String>,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The webhook query string carries the key and token.
        let webhook = self
            .default_webhook
            .as_deref()
            .map(|url| match url.split_once('?') {
                Some((base, _)) => format!("{base}?****"),
                None => url.to_string(),
            });
        f.debug_struct("ChatConfig")
            .field("default_webhook", &webhook)
            .finish()
    }
}

impl ChatConfig {
    pub fn new(default_webhook: Option<String>) -> Self {
        Self {
            default_webhook: default_webhook.filter(|url| !url.trim().is_empty()),
        }
    }

    /// Builds the incoming-webhook URL from its space/key/token parts.
    pub fn from_parts(base: &str, space_id: &str, key: &str, token: &str) -> Self {
        let url = format!(
            "{}/{}/messages?key={}&token={}",
            base.trim_end_matches('/'),
            space_id,
            key,
            token
        );
        Self::new(Some(url))
    }

    /// Picks the override when given, otherwise the configured default.
    pub fn resolve(&self, custom: Option<&str>) -> Result<(String, WebhookKind)> {
        if let Some(custom) = custom.map(str::trim).filter(|url| !url.is_empty()) {
            Url::parse(custom)
                .map_err(|e| Error::config(format!("invalid webhook URL: {e}")))?;
            return Ok((custom.to_string(), WebhookKind::Custom));
        }
        match &self.default_webhook {
            Some(url) => Ok((url.clone(), WebhookKind::Default)),
            None => Err(Error::config("Google Chat webhook URL not configured")),
        }
    }
}

#[derive(Clone)]
pub struct SourceHostConfig {
    pub api_url: String,
    pub username: String,
    pub app_password: String,
    pub workspace: String,
    pub repository: String,
}

impl SourceHostConfig {
    pub fn new(
        api_url: &str,
        username: impl ToString,
        app_password: impl ToString,
        workspace: impl ToString,
        repository: impl ToString,
    ) -> Result<Self> {
        Ok(Self {
            api_url: normalize_base_url(api_url)?,
            username: username.to_string(),
            app_password: app_password.to_string(),
            workspace: workspace.to_string(),
            repository: repository.to_string(),
        })
    }
}

impl fmt::Debug for SourceHostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceHostConfig")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("app_password", &"****")
            .field("workspace", &self.workspace)
            .field("repository", &self.repository)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub chat: ChatConfig,
    pub source_host: Option<SourceHostConfig>,
    pub timeout: Duration,
}

impl Config {
    pub fn new(tracker: TrackerConfig, chat: ChatConfig) -> Self {
        Self {
            tracker,
            chat,
            source_host: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_source_host(mut self, source_host: Option<SourceHostConfig>) -> Self {
        self.source_host = source_host;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source_host(&self) -> Result<&SourceHostConfig> {
        self.source_host
            .as_ref()
            .ok_or_else(|| Error::config("Bitbucket credentials not configured"))
    }

    /// Plain client for the webhook and source host. Tracker sessions build their own.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bugzilla-chat-report/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;
        Ok(client)
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| Error::config(format!("invalid URL `{raw}`: {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::config(format!("URL `{raw}` must be absolute")));
    }
    Ok(trimmed.to_string())
}
