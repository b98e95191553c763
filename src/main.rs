use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merge_bridge::config::{Config, DEFAULT_CONFIG_FILE};
use merge_bridge::correlation::PatternExtractor;
use merge_bridge::github::OctocrabConnector;
use merge_bridge::server::{AppState, build_router};
use merge_bridge::tracker::JiraClient;

#[derive(Parser)]
#[command(name = "merge-bridge")]
#[command(about = "Moves Jira issues to done when their GitHub pull requests merge", long_about = None)]
#[command(version)]
struct Cli {
    /// YAML config file. A missing file is fine; defaults and
    /// MERGE_BRIDGE_* variables still apply.
    #[arg(short, long, env = "MERGE_BRIDGE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("invalid configuration ({})", cli.config.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let credentials = config.credentials.build_store()?;
    let tracker = JiraClient::new(&config.jira, credentials.clone())
        .context("failed to build Jira client")?;
    let state = AppState::new(
        tracker,
        OctocrabConnector::new(config.github.clone()),
        credentials,
        PatternExtractor::with_case_insensitive(config.correlation.case_insensitive),
        config.jira.no_transition_policy,
    );

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        %addr,
        jira = %config.jira.base_url,
        policy = ?config.jira.no_transition_policy,
        "listening"
    );

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
