use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pr_notifier::aggregate::PullQuery;
use pr_notifier::config::AppConfig;
use pr_notifier::digest::{self, DigestOptions};
use pr_notifier::error::AppError;
use pr_notifier::merge;
use pr_notifier::platform::github::GitHubPlatform;
use pr_notifier::platform::Platform;
use pr_notifier::report;
use pr_notifier::session::Session;
use pr_notifier::slack::SlackClient;

#[derive(Parser)]
#[command(name = "pr-notifier", about = "Digest of open GitHub pull requests and their reviews")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Post a digest of open pull requests to Slack
    Digest {
        /// Print the digest instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print monthly merge and first-review averages
    Report,
    /// Print one enriched pull request as JSON
    Inspect {
        #[arg(long)]
        repo: String,
        #[arg(long)]
        number: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");

    let platforms = platforms(&config)?;

    match cli.command.unwrap_or(Command::Digest { dry_run: false }) {
        Command::Digest { dry_run } => run_digest(&config, platforms, dry_run).await?,
        Command::Report => run_report(&config, platforms).await?,
        Command::Inspect { repo, number } => run_inspect(platforms, &repo, number).await?,
    }

    Ok(())
}

fn platforms(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn Platform>>> {
    config
        .github
        .tokens
        .iter()
        .map(|token| -> anyhow::Result<Arc<dyn Platform>> {
            let platform = GitHubPlatform::new(token, config.github.base_url.as_deref())?;
            Ok(Arc::new(platform))
        })
        .collect()
}

async fn run_digest(
    config: &AppConfig,
    platforms: Vec<Arc<dyn Platform>>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let query = PullQuery::open(Utc::now()).with_drafts(config.pulls.with_drafts);
    let result = merge::collect(platforms, &config.repositories, &query).await?;

    let options = DigestOptions {
        repository_filter: config.repositories.names.clone(),
    };
    if dry_run {
        println!("{}", digest::render(&result, &options));
        return Ok(());
    }

    if config.slack.channels.is_empty() {
        return Err(AppError::Config("slack.channels is empty".to_string()).into());
    }

    let batches = digest::render_batches(&result, &options);
    let slack = SlackClient::new(config.slack_token()?);
    for channel in &config.slack.channels {
        for batch in &batches {
            slack.post_message(channel, batch).await?;
        }
    }

    tracing::info!(
        pulls = result.pulls.len(),
        messages = batches.len(),
        channels = config.slack.channels.len(),
        "Digest posted"
    );
    Ok(())
}

async fn run_report(config: &AppConfig, platforms: Vec<Arc<dyn Platform>>) -> anyhow::Result<()> {
    let query = PullQuery::history(Utc::now(), config.report.months);
    let result = merge::collect(platforms, &config.repositories, &query).await?;

    println!("{}", report::build(&result.pulls).render());
    Ok(())
}

async fn run_inspect(
    platforms: Vec<Arc<dyn Platform>>,
    repo: &str,
    number: u64,
) -> anyhow::Result<()> {
    let platform = platforms
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Config("no GitHub token configured".to_string()))?;

    let mut session = Session::connect(platform).await?;
    let repository = session.find_repository(repo).await?;
    let pull = session
        .get_pull(&repository, number, &PullQuery::open(Utc::now()))
        .await?;

    println!("{}", serde_json::to_string_pretty(&pull)?);
    Ok(())
}
