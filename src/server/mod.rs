mod handlers;

use crate::error::Result;
use crate::model::Config;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug)]
pub struct AppState {
    pub config: Config,
}

pub fn router(config: Config) -> Router {
    let app_state = Arc::new(AppState { config });
    Router::new()
        .route("/", get(handlers::root))
        .route("/bugzilla/current-day-status", get(handlers::current_day_status))
        .route("/bugzilla/qa-status", get(handlers::qa_status))
        .route("/bugzilla/get-priority-bug-miss", get(handlers::priority_bug_miss))
        .route("/bugzilla/get-sla-missed-bugs", get(handlers::sla_missed_bugs))
        .route("/bitbucket/open-prs", get(handlers::open_prs))
        .with_state(app_state)
}

pub async fn serve(config: Config, port: u16) -> Result<()> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    tracing::info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, router(config)).await?;
    Ok(())
}
