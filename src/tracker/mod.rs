pub mod fetcher;
pub mod session;

pub use fetcher::{RawReport, ReportFetcher};
pub use session::{extract_login_tokens, LoginTokens, Session, SessionProvider};
