use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    ChangelogPoller, CheckScheduler, Config, DedupGate, HttpFetcher, Notifier, OpenAiClient,
    Orchestrator, SlackClient, Summarizer,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "changelog-notifier")]
#[command(about = "Post the latest Shopify changelog entry, summarized, to a Slack channel")]
struct Args {
    /// Cron expression (seconds first) for recurring checks, e.g. "0 0 */12 * * *".
    /// Overrides SCHEDULE. Without either, the check runs once and exits.
    #[arg(short, long)]
    schedule: Option<String>,
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let fetcher = Arc::new(HttpFetcher::new(config.http_timeout)?);
    let model = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
        config.http_timeout,
    )?);
    let slack = Arc::new(SlackClient::new(
        config.slack_token.clone(),
        config.channel_id.clone(),
        config.slack_api_base.clone(),
        config.http_timeout,
    )?);

    let summarizer = Summarizer::new(fetcher.clone(), model);
    let poller = ChangelogPoller::new(fetcher, summarizer, config.changelog_url.clone())
        .context("Failed to set up changelog poller")?;

    Ok(Orchestrator::new(
        poller,
        DedupGate::new(slack.clone()),
        Notifier::new(slack),
    )
    .with_failure_alert(config.alert_after_failures))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,changelog_notifier=debug,shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    info!("Checking {}", config.changelog_url);

    let orchestrator = Arc::new(build_orchestrator(&config)?);

    // Immediately check and send the update on startup
    tokio::select! {
        outcome = orchestrator.run_once() => outcome.log(),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted during startup check");
            return Ok(());
        }
    }

    let Some(schedule) = args.schedule.or(config.schedule) else {
        return Ok(());
    };

    let mut scheduler = CheckScheduler::new().await?;
    scheduler.schedule_checks(&schedule, orchestrator).await?;
    scheduler.start().await?;

    info!("Waiting for scheduled checks (Ctrl-C to stop)");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    scheduler.shutdown().await?;
    Ok(())
}
