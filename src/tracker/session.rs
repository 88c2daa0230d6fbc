use crate::error::{AuthFailure, Error, Result};
use crate::model::{Endpoint, TrackerConfig};
use crate::parse::html::input_tags;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

pub const LOGIN_TOKEN_FIELD: &str = "Bugzilla_login_token";
pub const FORM_TOKEN_ID: &str = "token";
pub const SESSION_COOKIE: &str = "Bugzilla_login";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "The username or password you entered is not valid";

const BROWSER_AGENT: &str = "Mozilla/5.0";
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml";

/// Hidden anti-forgery values of the tracker's login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    pub login_token: String,
    pub token: String,
}

/// Cookie-bearing client for one report request. Never shared or reused.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl Session {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), endpoint.cgi())
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        let Some(header) = self.jar.cookies(&self.base_url) else {
            return false;
        };
        let Ok(header) = header.to_str() else {
            return false;
        };
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(cookie, _)| cookie == name)
    }
}

pub trait SessionProvider {
    async fn login(&self, timeout: Duration) -> Result<Session>;
}

impl SessionProvider for TrackerConfig {
    async fn login(&self, timeout: Duration) -> Result<Session> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("invalid tracker URL: {e}")))?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(BROWSER_AGENT)
            .timeout(timeout)
            .build()?;
        let login_url = self.endpoint(Endpoint::Report.cgi());

        tracing::info!(url = %login_url, "requesting tracker login form");
        let page = client
            .get(&login_url)
            .header(ACCEPT, HTML_ACCEPT)
            .send()
            .await?
            .text()
            .await?;
        let tokens = extract_login_tokens(&page)?;

        let form = [
            ("Bugzilla_login", self.credentials.email.as_str()),
            ("Bugzilla_password", self.credentials.password.as_str()),
            (LOGIN_TOKEN_FIELD, tokens.login_token.as_str()),
            (FORM_TOKEN_ID, tokens.token.as_str()),
            ("GoAheadAndLogIn", "Log in"),
            ("Bugzilla_remember", "on"),
            ("Bugzilla_restrictlogin", "off"),
        ];
        let response = client
            .post(&login_url)
            .header(ACCEPT, HTML_ACCEPT)
            .header(ORIGIN, &self.base_url)
            .header(REFERER, &login_url)
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if body.contains(INVALID_CREDENTIALS_MESSAGE) {
            tracing::warn!(status = status.as_u16(), "tracker rejected the credentials");
            return Err(Error::Authentication(AuthFailure::InvalidCredentials));
        }
        let session = Session {
            client,
            jar,
            base_url,
        };
        if !session.has_cookie(SESSION_COOKIE) {
            tracing::warn!(status = status.as_u16(), "tracker login returned no session cookie");
            return Err(Error::Authentication(AuthFailure::MissingSessionCookie));
        }
        tracing::info!(status = status.as_u16(), "tracker session established");
        Ok(session)
    }
}

/// Reads `<input name="Bugzilla_login_token">` and `<input id="token">` values.
pub fn extract_login_tokens(html: &str) -> Result<LoginTokens> {
    let inputs = input_tags(html);
    let value_of = |attr: &str, expected: &str| {
        inputs
            .iter()
            .find(|input| input.get(attr).map(String::as_str) == Some(expected))
            .and_then(|input| input.get("value").cloned())
    };
    let login_token = value_of("name", LOGIN_TOKEN_FIELD).ok_or(Error::TokenExtraction {
        missing: LOGIN_TOKEN_FIELD,
    })?;
    let token = value_of("id", FORM_TOKEN_ID).ok_or(Error::TokenExtraction {
        missing: FORM_TOKEN_ID,
    })?;
    Ok(LoginTokens { login_token, token })
}
