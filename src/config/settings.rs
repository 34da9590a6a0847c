//! Configuration settings for Transcripter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub database: DatabaseSettings,
    pub transcription: TranscriptionSettings,
    pub summarize: SummarizeSettings,
    pub reddit: RedditSettings,
    pub scraper: ScraperSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/transcripter".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Database settings.
///
/// The path may also be supplied through the `DB_PATH` environment variable,
/// which takes precedence over the configuration file. A missing path is a
/// fatal startup error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    pub path: String,
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Maximum bytes per audio chunk sent to the transcription API.
    pub max_chunk_bytes: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            // Whisper rejects uploads over 25 MB; stay a little under.
            max_chunk_bytes: 24 * 1024 * 1024,
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeSettings {
    /// Chat model for summarization and key-point extraction.
    pub model: String,
    /// Token budget per completion.
    pub max_tokens: u32,
}

impl Default for SummarizeSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 900,
        }
    }
}

/// Reddit API settings.
///
/// Credentials come from the environment (`REDDIT_CLIENT_ID`,
/// `REDDIT_CLIENT_SECRET`, `REDDIT_USER_AGENT`), never from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    /// Subreddit to scrape (without the `r/` prefix).
    pub subreddit: String,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            subreddit: "chronoodyssey".to_string(),
        }
    }
}

/// Scrape pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Default number of posts returned per scrape.
    pub post_limit: usize,
    /// Default number of top-level comments fetched per post.
    pub comment_limit_per_post: usize,
    /// Extra posts requested to compensate for topic-filter drops.
    pub overfetch: usize,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            post_limit: 10,
            comment_limit_per_post: 3,
            overfetch: 5,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TranscripterError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("transcripter")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Resolve the database path, preferring the `DB_PATH` environment
    /// variable over the configuration file.
    ///
    /// An unset path is a fatal configuration error: the schema cannot be
    /// initialized without it, so startup must abort.
    pub fn database_path(&self) -> crate::error::Result<PathBuf> {
        let raw = match std::env::var("DB_PATH") {
            Ok(p) if !p.is_empty() => p,
            _ => self.database.path.clone(),
        };

        if raw.is_empty() {
            return Err(crate::error::TranscripterError::Config(
                "database path is not set; define DB_PATH or database.path in config.toml"
                    .to_string(),
            ));
        }

        Ok(Self::expand_path(&raw))
    }
}
