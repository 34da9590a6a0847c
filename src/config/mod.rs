//! Configuration module for Transcripter.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    DatabaseSettings, GeneralSettings, RedditSettings, ScraperSettings, Settings,
    SummarizeSettings, TranscriptionSettings,
};
