//! Initialize configuration and database schema.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::is_api_key_configured;
use crate::store::Store;

/// Write a default config file if none exists and create the database
/// schema at the configured path.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Transcripter Init");
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config already exists: {}", config_path.display()));
    } else {
        settings.save_to(&config_path)?;
        Output::success(&format!("Wrote default config: {}", config_path.display()));
    }

    let db_path = settings.database_path()?;
    Store::new(&db_path)?;
    Output::success(&format!("Database schema ready: {}", db_path.display()));

    println!();
    Output::kv("Subreddit", &settings.reddit.subreddit);
    Output::kv("Whisper model", &settings.transcription.model);
    Output::kv("Chat model", &settings.summarize.model);
    println!();
    if !is_api_key_configured() {
        Output::warning("OPENAI_API_KEY is not set; transcription and summarization will fail.");
    }
    if std::env::var("REDDIT_CLIENT_ID").is_err() || std::env::var("REDDIT_CLIENT_SECRET").is_err()
    {
        Output::warning("REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET are not set; scraping will fail.");
    }

    Ok(())
}
