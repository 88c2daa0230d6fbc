use bugzilla_chat_report::bitbucket::PageProgress;
use bugzilla_chat_report::error::{Error, Result};
use bugzilla_chat_report::model::{
    ChatConfig, Config, Credentials, ReportEnvelope, ReportFormat, SourceHostConfig, TrackerConfig,
};
use bugzilla_chat_report::pipeline::{
    self, DispatchOptions, Stage, StageProgress, DEFAULT_SLA_DAYS, DEFAULT_TEAM,
};
use bugzilla_chat_report::report::MarkdownReport;
use bugzilla_chat_report::server::{self, DEFAULT_PORT};
use bugzilla_chat_report::utils::time::display_now;
use bugzilla_chat_report::utils::{MultiProgressNew, ProgressStyleTemplate};
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

const DEFAULT_PRODUCTS: [&str; 2] = ["BizomWeb", "Mobile App"];
const DEFAULT_COMPONENTS: [&str; 14] = [
    "API",
    "Aqua",
    "Backend",
    "Bourbon",
    "Cross Platform",
    "Custom Feature",
    "Distiman",
    "MDM (Changes)",
    "MDM (New)",
    "RetailerApp",
    "Templates (Changes)",
    "Templates (New)",
    "UI",
    "Windows Phone",
];

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Posts Bugzilla and Bitbucket summaries to Google Chat")]
struct Args {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct Settings {
    #[arg(long = "bugzilla_url", env = "BUGZILLA_URL", global = true)]
    bugzilla_url: Option<String>,
    #[arg(long = "bugzilla_email", env = "BUGZILLA_EMAIL", global = true)]
    bugzilla_email: Option<String>,
    #[arg(long = "bugzilla_password", env = "BUGZILLA_PASSWORD", hide_env_values = true, global = true)]
    bugzilla_password: Option<String>,
    #[arg(long = "saved_report_id", env = "REPORT_SAVED_ID", global = true)]
    saved_report_id: Option<String>,
    #[arg(long = "product", global = true, default_values_t = DEFAULT_PRODUCTS.map(String::from))]
    products: Vec<String>,
    #[arg(long = "component", global = true, default_values_t = DEFAULT_COMPONENTS.map(String::from))]
    components: Vec<String>,

    /// Complete webhook URL, takes precedence over the URL parts below.
    #[arg(long = "google_chat_webhook", env = "GOOGLE_CHAT_WEBHOOK", hide_env_values = true, global = true)]
    google_chat_webhook: Option<String>,
    #[arg(long = "google_chat_webhook_url", env = "GOOGLE_CHAT_WEBHOOK_URL", global = true)]
    google_chat_base_url: Option<String>,
    #[arg(long = "google_chat_space_id", env = "GOOGLE_CHAT_SPACE_ID", global = true)]
    google_chat_space_id: Option<String>,
    #[arg(long = "google_chat_key", env = "GOOGLE_CHAT_KEY", hide_env_values = true, global = true)]
    google_chat_key: Option<String>,
    #[arg(long = "google_chat_token", env = "GOOGLE_CHAT_TOKEN", hide_env_values = true, global = true)]
    google_chat_token: Option<String>,

    #[arg(long = "bitbucket_username", env = "BITBUCKET_USERNAME", global = true)]
    bitbucket_username: Option<String>,
    #[arg(long = "bitbucket_password", env = "BITBUCKET_PASSWORD", hide_env_values = true, global = true)]
    bitbucket_password: Option<String>,
    #[arg(long = "bitbucket_url", env = "BITBUCKET_URL", global = true, default_value = "https://api.bitbucket.org/2.0")]
    bitbucket_url: String,
    #[arg(long = "bitbucket_workspace", env = "BITBUCKET_WORKSPACE", global = true, default_value = "bizom")]
    bitbucket_workspace: String,
    #[arg(long = "bitbucket_repo", env = "BITBUCKET_REPO", global = true, default_value = "bizomweb2")]
    bitbucket_repo: String,

    #[arg(long = "timeout", env = "HTTP_TIMEOUT_SECS", global = true, default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Open bug counts per team.
    CurrentDayStatus(ReportArgs),
    /// Triage counts per QA contact.
    QaStatus(ReportArgs),
    /// Blocker and critical bugs of the last day.
    PriorityBugMiss(ReportArgs),
    /// Bugs of the last `days` days.
    SlaMissedBugs {
        #[command(flatten)]
        report: ReportArgs,
        #[arg(long, default_value_t = DEFAULT_SLA_DAYS)]
        days: u32,
    },
    /// Open pull requests of the configured repository.
    OpenPrs {
        /// Comma separated author names.
        #[arg(long)]
        authors: Option<String>,
        #[command(flatten)]
        chat: ChatArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct ReportArgs {
    #[arg(long = "notify_team", default_value = DEFAULT_TEAM)]
    team: String,
    #[arg(long, default_value = "csv")]
    format: String,
    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(clap::Args, Debug, Clone)]
struct ChatArgs {
    /// Post to this webhook instead of the configured one.
    #[arg(long = "webhook")]
    webhook: Option<String>,
    #[arg(long = "skip_chat")]
    skip_chat: bool,
    /// Also write the report as Markdown.
    #[arg(long = "markdown")]
    markdown: Option<PathBuf>,
}

impl ChatArgs {
    fn dispatch(&self) -> DispatchOptions {
        DispatchOptions::new(self.webhook.clone(), self.skip_chat)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(status = e.status_code(), "{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.settings.config()?;
    let multi_progress = MultiProgress::default();

    match args.command {
        Command::Serve { port } => server::serve(config, port).await,
        Command::CurrentDayStatus(report) => {
            let (pb, cb) = stage_spinner(&multi_progress);
            let result = pipeline::current_day_status(
                &config,
                &report.team,
                parse_format(&report.format)?,
                &report.chat.dispatch(),
                cb,
            )
            .await;
            let result = finish(&pb, result)?;
            write_markdown(report.chat.markdown.as_deref(), result.data.as_slice())?;
            print_envelope(&result.envelope)
        }
        Command::QaStatus(report) => {
            let (pb, cb) = stage_spinner(&multi_progress);
            let result = pipeline::qa_status(
                &config,
                parse_format(&report.format)?,
                &report.chat.dispatch(),
                cb,
            )
            .await;
            let result = finish(&pb, result)?;
            write_markdown(report.chat.markdown.as_deref(), result.data.as_slice())?;
            print_envelope(&result.envelope)
        }
        Command::PriorityBugMiss(report) => {
            let (pb, cb) = stage_spinner(&multi_progress);
            let result =
                pipeline::priority_bug_miss(&config, &report.team, &report.chat.dispatch(), cb)
                    .await;
            let result = finish(&pb, result)?;
            if let Some(data) = &result.data {
                write_markdown(report.chat.markdown.as_deref(), data)?;
            }
            print_envelope(&result.envelope)
        }
        Command::SlaMissedBugs { report, days } => {
            let (pb, cb) = stage_spinner(&multi_progress);
            let result = pipeline::sla_missed_bugs(
                &config,
                &report.team,
                days,
                &report.chat.dispatch(),
                cb,
            )
            .await;
            let result = finish(&pb, result)?;
            if let Some(data) = &result.data {
                write_markdown(report.chat.markdown.as_deref(), data)?;
            }
            print_envelope(&result.envelope)
        }
        Command::OpenPrs { authors, chat } => {
            let (pb, cb) = page_spinner(&multi_progress);
            let result =
                pipeline::open_pull_requests(&config, authors.as_deref(), &chat.dispatch(), cb)
                    .await;
            let result = finish(&pb, result)?;
            write_markdown(chat.markdown.as_deref(), result.data.as_slice())?;
            print_envelope(&result.envelope)
        }
    }
}

impl Settings {
    fn config(&self) -> Result<Config> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::config(format!("{name} is not set")))
        };
        let credentials = Credentials::new(
            required(&self.bugzilla_email, "BUGZILLA_EMAIL")?,
            required(&self.bugzilla_password, "BUGZILLA_PASSWORD")?,
        );
        let tracker = TrackerConfig::new(&required(&self.bugzilla_url, "BUGZILLA_URL")?, credentials)?
            .with_products(self.products.clone())
            .with_components(self.components.clone())
            .with_saved_report_id(self.saved_report_id.clone());

        let chat = match (
            &self.google_chat_webhook,
            &self.google_chat_base_url,
            &self.google_chat_space_id,
            &self.google_chat_key,
            &self.google_chat_token,
        ) {
            (Some(webhook), ..) => ChatConfig::new(Some(webhook.clone())),
            (None, Some(base), Some(space), Some(key), Some(token)) => {
                ChatConfig::from_parts(base, space, key, token)
            }
            _ => ChatConfig::new(None),
        };

        let source_host = match (&self.bitbucket_username, &self.bitbucket_password) {
            (Some(username), Some(password)) => Some(SourceHostConfig::new(
                &self.bitbucket_url,
                username,
                password,
                &self.bitbucket_workspace,
                &self.bitbucket_repo,
            )?),
            _ => None,
        };

        Ok(Config::new(tracker, chat)
            .with_source_host(source_host)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

fn parse_format(value: &str) -> Result<ReportFormat> {
    ReportFormat::parse(value).ok_or_else(|| Error::config(format!("unknown report format `{value}`")))
}

fn stage_spinner(multi_progress: &MultiProgress) -> (ProgressBar, StageProgress<'static>) {
    let pb = multi_progress.add_spinner(ProgressStyleTemplate::elapsed_spinner(), "Starting ...");
    let progress_pb = pb.clone();
    let progress: StageProgress = Box::new(move |stage: Stage| {
        progress_pb.set_message(format!("{} ...", stage.message()));
    });
    (pb, progress)
}

fn page_spinner(multi_progress: &MultiProgress) -> (ProgressBar, PageProgress<'static>) {
    let pb = multi_progress.add_spinner(ProgressStyleTemplate::only_message(), "Fetching pull requests ...");
    let progress_pb = pb.clone();
    let progress: PageProgress = Box::new(move |page: usize| {
        progress_pb.set_message(format!("Fetch pull requests (#{page} page) ..."));
    });
    (pb, progress)
}

fn finish<T>(pb: &ProgressBar, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => pb.finish_with_message("✅ Completed"),
        Err(e) => pb.abandon_with_message(format!("❌ {e}")),
    }
    result
}

fn write_markdown<R: MarkdownReport + ?Sized>(path: Option<&Path>, report: &R) -> Result<()> {
    match path {
        Some(path) => report.report_create(path, &display_now()),
        None => Ok(()),
    }
}

fn print_envelope(envelope: &ReportEnvelope) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}
