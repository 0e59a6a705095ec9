mod bot;
mod cli;
mod config;
mod error;
mod gemini;
mod logging;
mod prompt;
mod reddit;
mod report;
mod sentiment;
mod tracker;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use bot::ReplyBot;
use cli::{Cli, Command};
use config::BotConfig;
use gemini::GeminiClient;
use reddit::RedditClient;
use tracker::DedupTracker;
use ui::CycleProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BotConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Status => {
            logging::init_stderr(cli.verbose);
            let tracker = DedupTracker::try_load(&config.processed_file).with_context(|| {
                format!("failed to read {}", config.processed_file.display())
            })?;
            ui::print_status(tracker.path(), tracker.len(), &config.subreddits);
            if tracker.is_empty() {
                println!("  no items processed yet");
            }
        }
        Command::Mark { ids } => {
            logging::init_stderr(cli.verbose);
            let mut tracker = DedupTracker::try_load(&config.processed_file).with_context(|| {
                format!("failed to read {}", config.processed_file.display())
            })?;
            let failed = mark_ids(&mut tracker, &ids);
            if failed > 0 {
                anyhow::bail!(
                    "{failed} id(s) not written to {}",
                    config.processed_file.display()
                );
            }
        }
        Command::Classify { signal } => {
            ui::print_classification(&signal, DedupTracker::classify(&signal));
        }
        Command::Run => {
            let _guard = logging::init(&config.log_dir, cli.verbose)
                .context("failed to initialize logging")?;
            let mut bot = connect(config.clone()).await?;
            let mut tracker = DedupTracker::load(&config.processed_file);
            info!(count = tracker.len(), "loaded processed item ids");

            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_signal(cancel.clone()));
            bot.run(&mut tracker, &cancel).await;
        }
        Command::Once => {
            let _guard = logging::init(&config.log_dir, cli.verbose)
                .context("failed to initialize logging")?;
            let mut bot = connect(config.clone()).await?;
            let mut tracker = DedupTracker::load(&config.processed_file);

            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_signal(cancel.clone()));
            let progress = CycleProgress::start("scanning...");
            let report = bot.run_cycle(&mut tracker, &cancel).await;
            progress.complete(&report);
            progress.print_report(&report);
        }
    }

    Ok(())
}

/// Mark each id processed, reporting write failures. Returns how many failed.
fn mark_ids(tracker: &mut DedupTracker, ids: &[String]) -> usize {
    let mut failed = 0;
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if tracker.is_processed(id) {
            println!("{id} already processed");
            continue;
        }
        match tracker.try_mark_processed(id) {
            Ok(()) => println!("{id} marked processed"),
            Err(e) => {
                error!(id, error = %e, "failed to persist processed item");
                failed += 1;
            }
        }
    }
    failed
}

/// Validate the config, build both clients and verify the Reddit login.
async fn connect(config: BotConfig) -> Result<ReplyBot<RedditClient, GeminiClient>> {
    config.validate()?;

    let reddit = RedditClient::new(config.credentials())?;
    let me = reddit
        .whoami()
        .await
        .context("failed to log in to Reddit")?;
    info!(user = %me, "logged in to Reddit");

    let generator = if config.fixed_reply.is_some() {
        None
    } else {
        Some(
            GeminiClient::new(config.gemini.api_key.clone(), config.gemini.model.clone())?
                .with_max_output_tokens(config.gemini.max_output_tokens),
        )
    };

    Ok(ReplyBot::new(reddit, generator, config))
}

/// Cancel `token` on Ctrl-C or, on Unix, SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                token.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!(signal = "SIGINT", "shutdown requested"),
            _ = sigterm.recv() => info!(signal = "SIGTERM", "shutdown requested"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    }
    token.cancel();
}
