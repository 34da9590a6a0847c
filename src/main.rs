//! Transcripter CLI entry point.

use anyhow::Result;
use clap::Parser;
use transcripter::cli::{commands, Cli, Commands};
use transcripter::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("transcripter={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the temp directory exists
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Transcribe { url } => {
            commands::run_transcribe(url, settings).await?;
        }

        Commands::Scrape {
            post_limit,
            comment_limit,
        } => {
            commands::run_scrape(*post_limit, *comment_limit, settings).await?;
        }

        Commands::Summarize { input, keypoints } => {
            commands::run_summarize(input, *keypoints, settings).await?;
        }

        Commands::ProcessPosts { limit } => {
            commands::run_process_posts(*limit, settings).await?;
        }
    }

    Ok(())
}
