use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    MissingSessionCookie,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::MissingSessionCookie => write!(f, "no session cookie received"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("login failed: {0}")]
    Authentication(AuthFailure),

    #[error("login page is missing the `{missing}` token")]
    TokenExtraction { missing: &'static str },

    #[error("tracker responded with HTTP {status}")]
    Fetch { status: u16, body: String },

    #[error("bug status table not found, the session may need to log in again")]
    TableNotFound,

    #[error("report contains no usable records")]
    NoData,

    #[error("chat webhook responded with HTTP {status}: {body}")]
    Dispatch { status: u16, body: String },

    #[error("team `{team}` not found in the report, available teams: {}", available.join(", "))]
    UnknownTeam { team: String, available: Vec<String> },

    #[error("source host responded with HTTP {status}: {message}")]
    SourceHost { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("markdown report error: {0}")]
    Markdown(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// HTTP status used when the error is surfaced through the inbound API.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Authentication(_) => 401,
            Error::TokenExtraction { .. } => 502,
            Error::Fetch { status, .. } if (400..600).contains(status) => *status,
            Error::Fetch { .. } => 502,
            Error::TableNotFound | Error::NoData => 404,
            Error::Dispatch { .. } => 502,
            Error::UnknownTeam { .. } => 400,
            Error::SourceHost { status: 401, .. } => 401,
            Error::SourceHost { status: 404, .. } => 404,
            Error::SourceHost { .. } => 502,
            Error::Config(_) => 400,
            Error::Http(_) => 502,
            Error::Markdown(_) | Error::Json(_) | Error::Io(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
