//! Transcripter - game-community intelligence backend
//!
//! A backend glue service that turns scattered community content into a
//! queryable SQLite knowledge base for a single game.
//!
//! # Overview
//!
//! Transcripter allows you to:
//! - Transcribe YouTube videos via OpenAI Whisper, chunking long audio to
//!   respect the API payload limit
//! - Summarize transcripts and extract grouped key points with GPT-4o
//! - Scrape a subreddit, filter posts by a fixed topic vocabulary, and
//!   persist posts, comments, and topic associations
//! - Store game "build" metadata (equipment, skills, traits)
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `audio` - Video download and audio extraction (yt-dlp / ffmpeg)
//! - `chunking` - Byte-budget audio chunk planning
//! - `transcription` - Download → decode → chunk → Whisper pipeline
//! - `summarize` - GPT-4o summarization and key-point extraction
//! - `reddit` - Reddit API client
//! - `topics` - Keyword topic filter
//! - `scrape` - Fetch → filter → persist pipeline
//! - `store` - SQLite schema and upsert helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use transcripter::config::Settings;
//! use transcripter::transcription::TranscriptionPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = TranscriptionPipeline::new(&settings.transcription);
//!
//!     let outcome = pipeline
//!         .run("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("{}", outcome.text);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod reddit;
pub mod scrape;
pub mod store;
pub mod summarize;
pub mod topics;
pub mod transcription;

pub use error::{Result, TranscripterError};
